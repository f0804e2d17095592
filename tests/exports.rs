#![forbid(unsafe_code)]
mod common;

use std::fs;

use common::{big_roster, date, march_2026_weekends, minimal_roster};
use duty_roster::{calendar, export, generate_schedule, io};
use tempfile::tempdir;

#[test]
fn month_days_and_production_calendar() {
    assert_eq!(calendar::month_days(2026, 3).len(), 31);
    assert_eq!(calendar::month_days(2026, 2).len(), 28);
    assert_eq!(calendar::month_days(2028, 2).len(), 29);

    let weekends = calendar::weekends_only(2026, 3);
    assert_eq!(weekends.len(), 9);
    assert!(weekends.contains(&date(2026, 3, 1)));
    assert_eq!(calendar::production_days(2026, 3, &weekends), 22);

    // An extra mid-week holiday removes one working day.
    let with_holiday = calendar::parse_manual_holidays("2026-03-09", 2026, 3).unwrap();
    let mut all = weekends.clone();
    all.extend(with_holiday);
    assert_eq!(calendar::production_days(2026, 3, &all), 21);
}

#[test]
fn manual_holidays_reject_garbage_and_skip_other_months() {
    assert!(calendar::parse_manual_holidays("2026-03-08,not-a-date", 2026, 3).is_err());

    let parsed = calendar::parse_manual_holidays("2026-03-08, 2026-04-01,", 2026, 3).unwrap();
    assert_eq!(parsed.len(), 1);
    assert!(parsed.contains(&date(2026, 3, 8)));
}

#[test]
fn ics_files_carry_the_shift_time_mapping() {
    let schedule =
        generate_schedule(&minimal_roster(), &march_2026_weekends()).expect("feasible roster");
    let dir = tempdir().unwrap();

    let paths = export::export_ics(&schedule, dir.path()).unwrap();
    assert_eq!(paths.len(), 4);

    let morning = fs::read_to_string(dir.path().join("morning.ics")).unwrap();
    assert!(morning.starts_with("BEGIN:VCALENDAR"));
    assert!(morning.contains("DTSTART;TZID=Europe/Moscow:20260302T080000"));
    assert!(morning.contains("DTEND;TZID=Europe/Moscow:20260302T170000"));

    // The evening ends at midnight of the following day.
    let evening = fs::read_to_string(dir.path().join("evening.ics")).unwrap();
    assert!(evening.contains("DTSTART;TZID=Europe/Moscow:20260302T150000"));
    assert!(evening.contains("DTEND;TZID=Europe/Moscow:20260303T000000"));

    let night = fs::read_to_string(dir.path().join("night.ics")).unwrap();
    assert!(night.contains("DTSTART;TZID=Europe/Moscow:20260302T000000"));
    assert!(night.contains("DTEND;TZID=Europe/Moscow:20260302T080000"));

    // Khabarovsk workdays are local-time events.
    let workday = fs::read_to_string(dir.path().join("workday.ics")).unwrap();
    assert!(workday.contains("TZID=Asia/Vladivostok"));
}

#[test]
fn csv_workbook_has_grid_stats_and_legend() {
    let config = big_roster();
    let schedule =
        generate_schedule(&config, &march_2026_weekends()).expect("feasible roster");
    let dir = tempdir().unwrap();

    let paths = export::export_csv_workbook(&schedule, dir.path()).unwrap();
    assert_eq!(paths.len(), 3);

    let grid = fs::read_to_string(dir.path().join("schedule.csv")).unwrap();
    let lines: Vec<&str> = grid.lines().collect();
    // Header plus one row per employee; a column per day plus name and city.
    assert_eq!(lines.len(), config.employees.len() + 1);
    assert_eq!(lines[0].split(',').count(), 31 + 2);
    assert!(lines[0].contains("01*")); // the 1st of March 2026 is a Sunday

    let stats = fs::read_to_string(dir.path().join("stats.csv")).unwrap();
    let header = stats.lines().next().unwrap();
    assert_eq!(header.split(',').count(), 17);
    assert_eq!(stats.lines().count(), config.employees.len() + 1);

    let legend = fs::read_to_string(dir.path().join("legend.csv")).unwrap();
    assert!(legend.lines().next().unwrap().starts_with("code,"));
}

#[test]
fn schedule_json_roundtrips_through_config_loader() {
    let config = minimal_roster();
    let schedule =
        generate_schedule(&config, &march_2026_weekends()).expect("feasible roster");
    let dir = tempdir().unwrap();

    let config_path = dir.path().join("config.json");
    fs::write(&config_path, serde_json::to_vec_pretty(&config).unwrap()).unwrap();
    let loaded = io::load_config(&config_path).unwrap();
    assert_eq!(loaded, config);

    let schedule_path = dir.path().join("schedule.json");
    io::write_schedule_json(&schedule_path, &schedule).unwrap();
    let raw = fs::read(&schedule_path).unwrap();
    let parsed: duty_roster::Schedule = serde_json::from_slice(&raw).unwrap();
    assert_eq!(parsed, schedule);
}
