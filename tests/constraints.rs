#![forbid(unsafe_code)]
mod common;

use common::{assert_invariants, big_roster, date, march_2026_weekends, minimal_roster};
use duty_roster::{
    collect_config_issues, generate_schedule, CarryOverState, City, PinnedAssignment,
    ScheduleError, ShiftType, VacationPeriod,
};

#[test]
fn night_pin_on_moscow_employee_is_rejected() {
    let mut config = minimal_roster();
    config.pins = vec![PinnedAssignment {
        date: date(2026, 3, 7),
        employee_name: "Petrov".to_string(),
        shift: ShiftType::Night,
    }];

    let err = generate_schedule(&config, &march_2026_weekends()).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidPin(_)), "got {err}");
}

#[test]
fn pin_on_vacation_day_is_rejected() {
    let mut config = minimal_roster();
    config
        .employees
        .iter_mut()
        .find(|e| e.name == "Petrov")
        .unwrap()
        .vacations = vec![VacationPeriod::new(date(2026, 3, 6), date(2026, 3, 8)).unwrap()];
    config.pins = vec![PinnedAssignment {
        date: date(2026, 3, 7),
        employee_name: "Petrov".to_string(),
        shift: ShiftType::Evening,
    }];

    let err = generate_schedule(&config, &march_2026_weekends()).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidPin(_)), "got {err}");
}

#[test]
fn pins_are_honoured_verbatim() {
    let mut config = big_roster();
    config.pins = vec![
        PinnedAssignment {
            date: date(2026, 3, 6),
            employee_name: "Petrov".to_string(),
            shift: ShiftType::Evening,
        },
        PinnedAssignment {
            date: date(2026, 3, 5),
            employee_name: "Ivanov".to_string(),
            shift: ShiftType::DayOff,
        },
    ];

    let schedule = generate_schedule(&config, &march_2026_weekends()).expect("feasible roster");
    assert_invariants(&schedule);

    let mar5 = schedule.days.iter().find(|d| d.date == date(2026, 3, 5)).unwrap();
    assert_eq!(mar5.shift_of("Ivanov"), Some(ShiftType::DayOff));
    let mar6 = schedule.days.iter().find(|d| d.date == date(2026, 3, 6)).unwrap();
    assert_eq!(mar6.shift_of("Petrov"), Some(ShiftType::Evening));
}

#[test]
fn carry_over_streak_forces_first_day_off() {
    let mut config = minimal_roster();
    config.carry_over = vec![CarryOverState {
        employee_name: "Ivanov".to_string(),
        consecutive_working: 5,
        consecutive_off: 0,
        last_shift: Some(ShiftType::Workday),
    }];

    let schedule = generate_schedule(&config, &march_2026_weekends()).expect("feasible roster");
    let first = &schedule.days[0];
    assert_eq!(first.shift_of("Ivanov"), Some(ShiftType::DayOff));
}

#[test]
fn uncoverable_evening_exhausts_backtracking() {
    let mut config = minimal_roster();
    // All evening-capable Moscow employees rest on the 12th; Sidorov still
    // covers the morning, so the evening is the shift that cannot be filled.
    let blocked = VacationPeriod::new(date(2026, 3, 12), date(2026, 3, 12)).unwrap();
    for name in ["Ivanov", "Petrov", "Kozlov"] {
        config
            .employees
            .iter_mut()
            .find(|e| e.name == name)
            .unwrap()
            .vacations = vec![blocked];
    }

    let err = generate_schedule(&config, &march_2026_weekends()).unwrap_err();
    match err {
        ScheduleError::Infeasible { date: d, shift, .. } => {
            assert_eq!(d, date(2026, 3, 12));
            assert_eq!(shift, ShiftType::Evening);
        }
        other => panic!("expected Infeasible, got {other}"),
    }
}

#[test]
fn undersized_rosters_are_rejected() {
    let mut config = minimal_roster();
    config.employees.retain(|e| e.name != "Kozlov");
    let err = generate_schedule(&config, &march_2026_weekends()).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidRoster(_)), "got {err}");

    let mut config = minimal_roster();
    config.employees.retain(|e| e.name != "Popov");
    let err = generate_schedule(&config, &march_2026_weekends()).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidRoster(_)), "got {err}");
}

#[test]
fn contradictory_restrictions_are_rejected() {
    let mut config = minimal_roster();
    {
        let kozlov = config
            .employees
            .iter_mut()
            .find(|e| e.name == "Kozlov")
            .unwrap();
        kozlov.morning_only = true;
        kozlov.evening_only = true;
    }
    let err = generate_schedule(&config, &march_2026_weekends()).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidRoster(_)), "got {err}");

    let mut config = minimal_roster();
    config
        .employees
        .iter_mut()
        .find(|e| e.name == "Smirnov")
        .unwrap()
        .always_on_duty = true;
    let err = generate_schedule(&config, &march_2026_weekends()).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidRoster(_)), "got {err}");
}

#[test]
fn config_review_warns_without_rejecting() {
    let mut config = big_roster();
    // Ivanov is on duty but away for the whole month.
    config
        .employees
        .iter_mut()
        .find(|e| e.name == "Ivanov")
        .unwrap()
        .vacations = vec![VacationPeriod::new(date(2026, 3, 1), date(2026, 3, 31)).unwrap()];
    // Petrov is below half time.
    config
        .employees
        .iter_mut()
        .find(|e| e.name == "Petrov")
        .unwrap()
        .workload_pct = 40;
    // Kozlov is alone in his group.
    config
        .employees
        .iter_mut()
        .find(|e| e.name == "Kozlov")
        .unwrap()
        .group = Some("solo".to_string());

    let (errors, warnings) = collect_config_issues(&config);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert!(
        warnings
            .iter()
            .any(|w| w.contains("Ivanov") && w.contains("blocked for the whole month")),
        "missing blocked-month warning: {warnings:?}"
    );
    assert!(
        warnings
            .iter()
            .any(|w| w.contains("Petrov") && w.contains("below half time")),
        "missing workload warning: {warnings:?}"
    );
    assert!(
        warnings
            .iter()
            .any(|w| w.contains("solo") && w.contains("single member")),
        "missing single-member group warning: {warnings:?}"
    );
}

#[test]
fn grouped_employees_never_share_a_shift() {
    let mut config = big_roster();
    for name in ["Ivanov", "Petrov"] {
        config
            .employees
            .iter_mut()
            .find(|e| e.name == name)
            .unwrap()
            .group = Some("core".to_string());
    }

    let schedule = generate_schedule(&config, &march_2026_weekends()).expect("feasible roster");
    assert_invariants(&schedule);

    for day in &schedule.days {
        for shift in [
            ShiftType::Morning,
            ShiftType::Evening,
            ShiftType::Night,
            ShiftType::Workday,
        ] {
            let both = day.bucket(shift).iter().filter(|n| *n == "Ivanov" || *n == "Petrov");
            assert!(both.count() <= 1, "{} shared on {}", shift.label(), day.date);
        }
    }
}

#[test]
fn night_cap_is_respected() {
    let mut config = big_roster();
    config
        .employees
        .iter_mut()
        .find(|e| e.name == "Smirnov")
        .unwrap()
        .max_night_shifts = Some(8);

    let schedule = generate_schedule(&config, &march_2026_weekends()).expect("feasible roster");
    assert_invariants(&schedule);

    let nights = schedule
        .days
        .iter()
        .filter(|d| d.night.iter().any(|n| n == "Smirnov"))
        .count();
    assert!(nights <= 8, "Smirnov worked {nights} nights");
}

#[test]
fn weekly_day_off_is_never_worked() {
    let mut config = big_roster();
    // Kozlov never works Wednesdays (weekday index 2).
    config
        .employees
        .iter_mut()
        .find(|e| e.name == "Kozlov")
        .unwrap()
        .days_off_weekly = [2u8].into_iter().collect();

    let schedule = generate_schedule(&config, &march_2026_weekends()).expect("feasible roster");
    assert_invariants(&schedule);

    for day in &schedule.days {
        if chrono::Datelike::weekday(&day.date).num_days_from_monday() == 2 {
            let shift = day.shift_of("Kozlov").unwrap();
            assert!(!shift.is_working(), "Kozlov works a Wednesday: {}", day.date);
        }
    }
}

#[test]
fn moscow_and_khabarovsk_duty_stay_in_their_cities() {
    let schedule =
        generate_schedule(&big_roster(), &march_2026_weekends()).expect("feasible roster");
    let moscow = |n: &str| schedule.config.find_employee(n).unwrap().city == City::Moscow;
    for day in &schedule.days {
        assert!(moscow(&day.morning[0]));
        assert!(moscow(&day.evening[0]));
        assert!(!moscow(&day.night[0]));
    }
}
