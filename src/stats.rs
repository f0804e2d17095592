use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::calendar;
use crate::model::{City, Schedule, ShiftType};
use crate::scheduler::{target_working_days, vacation_business_days};

/// Per-employee roster statistics, one row of the workbook stats sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeStats {
    pub name: String,
    pub city: City,
    pub total_working: u32,
    pub target: u32,
    pub target_delta: i64,
    pub morning: u32,
    pub evening: u32,
    pub night: u32,
    pub workday: u32,
    pub day_off: u32,
    pub vacation: u32,
    pub weekend_work: u32,
    pub holiday_work: u32,
    pub max_streak_work: u32,
    pub max_streak_rest: u32,
    pub isolated_off: u32,
    pub paired_off: u32,
}

/// Index every employee's month: name -> date -> shift.
pub fn build_assignments(schedule: &Schedule) -> BTreeMap<String, BTreeMap<NaiveDate, ShiftType>> {
    let mut out: BTreeMap<String, BTreeMap<NaiveDate, ShiftType>> = BTreeMap::new();
    for day in &schedule.days {
        for shift in [
            ShiftType::Morning,
            ShiftType::Evening,
            ShiftType::Night,
            ShiftType::Workday,
            ShiftType::DayOff,
            ShiftType::Vacation,
        ] {
            for name in day.bucket(shift) {
                out.entry(name.clone()).or_default().insert(day.date, shift);
            }
        }
    }
    out
}

/// Compute the statistics sheet for every configured employee.
pub fn compute_stats(schedule: &Schedule) -> Vec<EmployeeStats> {
    let assignments = build_assignments(schedule);
    let production = calendar::production_days(
        schedule.config.year,
        schedule.config.month,
        &schedule.holidays,
    );

    schedule
        .config
        .employees
        .iter()
        .map(|emp| {
            let empty = BTreeMap::new();
            let month = assignments.get(&emp.name).unwrap_or(&empty);
            let count = |s: ShiftType| month.values().filter(|v| **v == s).count() as u32;

            let morning = count(ShiftType::Morning);
            let evening = count(ShiftType::Evening);
            let night = count(ShiftType::Night);
            let workday = count(ShiftType::Workday);
            let total_working = morning + evening + night + workday;

            let weekend_work = month
                .iter()
                .filter(|(d, s)| calendar::is_weekend(**d) && s.is_working())
                .count() as u32;
            let holiday_work = month
                .iter()
                .filter(|(d, s)| {
                    schedule.holidays.contains(*d) && !calendar::is_weekend(**d) && s.is_working()
                })
                .count() as u32;

            let target = target_working_days(production, emp.workload_pct)
                .saturating_sub(vacation_business_days(
                    emp,
                    schedule.config.year,
                    schedule.config.month,
                ));

            EmployeeStats {
                name: emp.name.clone(),
                city: emp.city,
                total_working,
                target,
                target_delta: i64::from(total_working) - i64::from(target),
                morning,
                evening,
                night,
                workday,
                day_off: count(ShiftType::DayOff),
                vacation: count(ShiftType::Vacation),
                weekend_work,
                holiday_work,
                max_streak_work: max_streak(month, true),
                max_streak_rest: max_streak(month, false),
                isolated_off: count_isolated_off(&emp.name, schedule),
                paired_off: count_paired_off(&emp.name, schedule),
            }
        })
        .collect()
}

fn max_streak(month: &BTreeMap<NaiveDate, ShiftType>, working: bool) -> u32 {
    let mut best = 0u32;
    let mut current = 0u32;
    for shift in month.values() {
        if shift.is_working() == working {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

fn is_resting(schedule: &Schedule, day_idx: usize, name: &str) -> bool {
    let day = &schedule.days[day_idx];
    day.day_off.iter().any(|n| n == name) || day.vacation.iter().any(|n| n == name)
}

/// Day-offs with both in-month neighbours working.
fn count_isolated_off(name: &str, schedule: &Schedule) -> u32 {
    let days = &schedule.days;
    let mut count = 0u32;
    for i in 0..days.len() {
        if !days[i].day_off.iter().any(|n| n == name) {
            continue;
        }
        let left_ok = i == 0 || is_resting(schedule, i - 1, name);
        let right_ok = i == days.len() - 1 || is_resting(schedule, i + 1, name);
        if !left_ok && !right_ok {
            count += 1;
        }
    }
    count
}

/// Rest blocks of two days and more.
fn count_paired_off(name: &str, schedule: &Schedule) -> u32 {
    let days = &schedule.days;
    let mut count = 0u32;
    let mut i = 0usize;
    while i < days.len() {
        if is_resting(schedule, i, name) {
            let mut j = i;
            while j < days.len() && is_resting(schedule, j, name) {
                j += 1;
            }
            if j - i >= 2 {
                count += 1;
            }
            i = j;
        } else {
            i += 1;
        }
    }
    count
}
