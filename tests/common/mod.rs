#![allow(dead_code)]
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use duty_roster::{calendar, City, Config, Employee, Schedule, ScheduleType, ShiftType};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn employee(name: &str, city: City, schedule_type: ScheduleType) -> Employee {
    Employee {
        name: name.to_string(),
        city,
        schedule_type,
        on_duty: true,
        always_on_duty: false,
        morning_only: false,
        evening_only: false,
        vacations: Vec::new(),
        unavailable_dates: BTreeSet::new(),
        max_morning_shifts: None,
        max_evening_shifts: None,
        max_night_shifts: None,
        preferred_shift: None,
        workload_pct: 100,
        days_off_weekly: BTreeSet::new(),
        max_consecutive_working: None,
        group: None,
    }
}

pub fn march_2026_weekends() -> BTreeSet<NaiveDate> {
    calendar::weekends_only(2026, 3)
}

/// Scenario roster: four Moscow duty, two Khabarovsk duty, March 2026.
pub fn minimal_roster() -> Config {
    let mut sidorov = employee("Sidorov", City::Moscow, ScheduleType::FiveTwo);
    sidorov.morning_only = true;
    sidorov.always_on_duty = true;
    Config {
        month: 3,
        year: 2026,
        seed: 42,
        timezone: "Europe/Moscow".to_string(),
        employees: vec![
            employee("Ivanov", City::Moscow, ScheduleType::Flexible),
            employee("Petrov", City::Moscow, ScheduleType::Flexible),
            employee("Kozlov", City::Moscow, ScheduleType::Flexible),
            sidorov,
            employee("Smirnov", City::Khabarovsk, ScheduleType::Flexible),
            employee("Popov", City::Khabarovsk, ScheduleType::Flexible),
        ],
        pins: Vec::new(),
        carry_over: Vec::new(),
    }
}

/// A roster with enough slack for the fairness passes to settle everyone on
/// their norm: five Moscow duty, three Khabarovsk duty, two office workers.
pub fn big_roster() -> Config {
    let mut sidorov = employee("Sidorov", City::Moscow, ScheduleType::FiveTwo);
    sidorov.morning_only = true;
    sidorov.always_on_duty = true;
    let mut abashina = employee("Abashina", City::Moscow, ScheduleType::Flexible);
    abashina.preferred_shift = Some(ShiftType::Morning);
    let mut levchenko = employee("Levchenko", City::Moscow, ScheduleType::FiveTwo);
    levchenko.on_duty = false;
    let mut khadzugov = employee("Khadzugov", City::Moscow, ScheduleType::FiveTwo);
    khadzugov.on_duty = false;
    Config {
        month: 3,
        year: 2026,
        seed: 42,
        timezone: "Europe/Moscow".to_string(),
        employees: vec![
            employee("Ivanov", City::Moscow, ScheduleType::Flexible),
            employee("Petrov", City::Moscow, ScheduleType::Flexible),
            employee("Kozlov", City::Moscow, ScheduleType::Flexible),
            abashina,
            sidorov,
            employee("Smirnov", City::Khabarovsk, ScheduleType::Flexible),
            employee("Popov", City::Khabarovsk, ScheduleType::Flexible),
            employee("Golubev", City::Khabarovsk, ScheduleType::Flexible),
            levchenko,
            khadzugov,
        ],
        pins: Vec::new(),
        carry_over: Vec::new(),
    }
}

/// Check the universal roster invariants: coverage, exclusivity, city and
/// restriction rules, rest transitions, streak limits, caps, groups.
pub fn assert_invariants(s: &Schedule) {
    let cfg = &s.config;
    let emp = |name: &str| cfg.find_employee(name).expect("assignee is a known employee");
    let all_shifts = [
        ShiftType::Morning,
        ShiftType::Evening,
        ShiftType::Night,
        ShiftType::Workday,
        ShiftType::DayOff,
        ShiftType::Vacation,
    ];

    for day in &s.days {
        assert_eq!(day.morning.len(), 1, "morning coverage on {}", day.date);
        assert_eq!(day.evening.len(), 1, "evening coverage on {}", day.date);
        assert_eq!(day.night.len(), 1, "night coverage on {}", day.date);

        let mut seen = BTreeSet::new();
        for shift in all_shifts {
            for name in day.bucket(shift) {
                assert!(seen.insert(name.clone()), "{name} assigned twice on {}", day.date);
            }
        }
        assert_eq!(seen.len(), cfg.employees.len(), "missing assignee on {}", day.date);

        assert_eq!(emp(&day.morning[0]).city, City::Moscow);
        assert_eq!(emp(&day.evening[0]).city, City::Moscow);
        assert_eq!(emp(&day.night[0]).city, City::Khabarovsk);

        assert!(!emp(&day.morning[0]).evening_only, "evening_only morning on {}", day.date);
        assert!(!emp(&day.evening[0]).morning_only, "morning_only evening on {}", day.date);

        for shift in [
            ShiftType::Morning,
            ShiftType::Evening,
            ShiftType::Night,
            ShiftType::Workday,
        ] {
            let names = day.bucket(shift);
            for (i, a) in names.iter().enumerate() {
                for b in names.iter().skip(i + 1) {
                    let (ga, gb) = (emp(a).group.clone(), emp(b).group.clone());
                    if let (Some(ga), Some(gb)) = (ga, gb) {
                        assert_ne!(ga, gb, "group clash {a}/{b} on {}", day.date);
                    }
                }
            }
        }

        for e in &cfg.employees {
            if e.is_blocked(day.date) {
                let shift = day.shift_of(&e.name).unwrap();
                assert!(
                    matches!(shift, ShiftType::DayOff | ShiftType::Vacation),
                    "{} assigned {} while blocked on {}",
                    e.name,
                    shift.label(),
                    day.date
                );
            }
        }
    }

    for e in &cfg.employees {
        let carry = cfg.carry_over.iter().find(|c| c.employee_name == e.name);
        let mut prev = carry.and_then(|c| c.last_shift);
        let mut work_run = carry.map(|c| c.consecutive_working).unwrap_or(0);
        let mut off_run = carry.map(|c| c.consecutive_off).unwrap_or(0);
        let mut counts: BTreeMap<ShiftType, u32> = BTreeMap::new();

        for day in &s.days {
            let shift = day.shift_of(&e.name).unwrap();
            *counts.entry(shift).or_default() += 1;

            match prev {
                Some(ShiftType::Evening) => assert!(
                    !matches!(shift, ShiftType::Morning | ShiftType::Workday | ShiftType::Night),
                    "{} works {} right after an evening ({})",
                    e.name,
                    shift.label(),
                    day.date
                ),
                Some(ShiftType::Night) => assert!(
                    !shift.is_working(),
                    "{} works right after a night ({})",
                    e.name,
                    day.date
                ),
                _ => {}
            }

            if shift.is_working() {
                work_run += 1;
                off_run = 0;
                let relaxed = e.schedule_type == ScheduleType::Flexible
                    && e.on_duty
                    && !e.duty_only();
                let cap = if relaxed { 6 } else { 5 };
                assert!(
                    work_run <= cap,
                    "{} works {work_run} days in a row up to {}",
                    e.name,
                    day.date
                );
            } else {
                work_run = 0;
                // Forced rest (blackouts, vacations, 5/2 holidays) is exempt
                // from the off-run limit.
                let forced = shift == ShiftType::Vacation
                    || e.is_blocked(day.date)
                    || (e.schedule_type == ScheduleType::FiveTwo && day.is_holiday);
                if forced {
                    off_run = 0;
                } else {
                    off_run += 1;
                    assert!(
                        off_run <= 3,
                        "{} rests {off_run} days in a row up to {}",
                        e.name,
                        day.date
                    );
                }
            }
            prev = Some(shift);
        }

        for (shift, cap) in [
            (ShiftType::Morning, e.max_morning_shifts),
            (ShiftType::Evening, e.max_evening_shifts),
            (ShiftType::Night, e.max_night_shifts),
        ] {
            if let Some(cap) = cap {
                let held = counts.get(&shift).copied().unwrap_or(0);
                assert!(held <= cap, "{} exceeds {} cap: {held}", e.name, shift.label());
            }
        }

        if e.morning_only {
            assert_eq!(counts.get(&ShiftType::Evening), None, "{} evening", e.name);
            assert_eq!(counts.get(&ShiftType::Night), None, "{} night", e.name);
        }
        if e.evening_only {
            assert_eq!(counts.get(&ShiftType::Morning), None, "{} morning", e.name);
            assert_eq!(counts.get(&ShiftType::Night), None, "{} night", e.name);
        }
    }
}
