#![forbid(unsafe_code)]
mod common;

use common::{assert_invariants, big_roster, march_2026_weekends};
use duty_roster::scheduler::reapply_repairs;
use duty_roster::{compute_stats, generate_schedule, City, ScheduleType};

#[test]
fn repairs_stay_valid_when_reapplied() {
    let schedule =
        generate_schedule(&big_roster(), &march_2026_weekends()).expect("feasible roster");

    let mut again = schedule.clone();
    reapply_repairs(&mut again);
    assert_invariants(&again);

    // Reapplication is itself deterministic.
    let mut third = schedule.clone();
    reapply_repairs(&mut third);
    assert_eq!(again, third);
}

#[test]
fn moscow_totals_land_on_their_norm() {
    let schedule =
        generate_schedule(&big_roster(), &march_2026_weekends()).expect("feasible roster");
    assert_invariants(&schedule);

    for s in compute_stats(&schedule) {
        if s.city == City::Moscow {
            assert!(
                s.target_delta.abs() <= 1,
                "{} worked {} against a norm of {}",
                s.name,
                s.total_working,
                s.target
            );
        }
    }
}

#[test]
fn khabarovsk_totals_stay_close_to_norm() {
    let schedule =
        generate_schedule(&big_roster(), &march_2026_weekends()).expect("feasible roster");

    // Every night consumes the following day as mandatory rest, capping the
    // night crew at days_in_month - nights_worked: slightly short of the
    // office norm, never over.
    for s in compute_stats(&schedule) {
        if s.city == City::Khabarovsk {
            assert!(
                (-3..=1).contains(&s.target_delta),
                "{} worked {} against a norm of {}",
                s.name,
                s.total_working,
                s.target
            );
        }
    }
}

#[test]
fn office_staff_follow_the_production_calendar() {
    let schedule =
        generate_schedule(&big_roster(), &march_2026_weekends()).expect("feasible roster");

    for s in compute_stats(&schedule) {
        let emp = schedule.config.find_employee(&s.name).unwrap();
        if !emp.on_duty {
            assert_eq!(s.target_delta, 0, "{} off the office norm", s.name);
            assert_eq!(s.weekend_work, 0, "{} worked a weekend", s.name);
            assert_eq!(s.morning + s.evening + s.night, 0);
        }
    }
}

#[test]
fn flexible_duty_rest_is_not_fragmented() {
    let schedule =
        generate_schedule(&big_roster(), &march_2026_weekends()).expect("feasible roster");
    let stats = compute_stats(&schedule);

    // The repair pipeline pairs rest days up. The night crew is exempt: the
    // rest day after each night is structurally single.
    for s in &stats {
        let emp = schedule.config.find_employee(&s.name).unwrap();
        if emp.on_duty
            && emp.city == City::Moscow
            && emp.schedule_type == ScheduleType::Flexible
            && s.day_off >= 8
        {
            assert!(
                s.paired_off >= 1,
                "{} has {} off-days but none paired",
                s.name,
                s.day_off
            );
        }
    }
}
