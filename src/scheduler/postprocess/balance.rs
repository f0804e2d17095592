use crate::model::{City, ScheduleType, ShiftType};

use super::super::types::MIN_WORK_BETWEEN_OFFS;
use super::{pass_rounds, Change, CwCap, Pipeline};

/// Even out weekend/holiday working days among flexible duty employees of the
/// same city, to within one day.
///
/// On a weekend day the under-loaded employee takes over the over-loaded
/// employee's shift and the over-loaded employee rests; the working-day totals
/// drift this causes is settled by the target adjustment pass further down
/// the pipeline.
pub(super) fn balance_weekend_work(p: &mut Pipeline<'_>) {
    for city in [City::Moscow, City::Khabarovsk] {
        let cohort = flexible_duty(p, city);
        if cohort.len() < 2 {
            continue;
        }
        for _ in 0..pass_rounds() {
            let (max_e, max_c) = extreme(&cohort, |e| p.weekend_work(e), true);
            let (min_e, min_c) = extreme(&cohort, |e| p.weekend_work(e), false);
            if max_c - min_c <= 1 {
                break;
            }
            let mut swapped = false;
            for day in 0..p.len_days() {
                if !p.is_holiday[day] {
                    continue;
                }
                let shift = p.grid[max_e][day];
                if !shift.is_working() || p.grid[min_e][day] != ShiftType::DayOff {
                    continue;
                }
                let changes: Vec<Change> =
                    vec![(max_e, day, ShiftType::DayOff), (min_e, day, shift)];
                if p.try_swap(&changes, CwCap::Strict, |_| true) {
                    swapped = true;
                    break;
                }
            }
            if !swapped {
                break;
            }
        }
    }
}

/// Bring per-employee morning/evening/night counts within one of each other,
/// inside each city and eligibility cohort.
pub(super) fn balance_duty_shifts(p: &mut Pipeline<'_>) {
    for shift in [ShiftType::Morning, ShiftType::Evening, ShiftType::Night] {
        let cohorts = eligibility_cohorts(p, shift);
        for cohort in cohorts {
            if cohort.len() < 2 {
                continue;
            }
            for _ in 0..pass_rounds() {
                let (max_e, max_c) = extreme(&cohort, |e| p.shift_total(e, shift), true);
                let (min_e, min_c) = extreme(&cohort, |e| p.shift_total(e, shift), false);
                if max_c - min_c <= 1 {
                    break;
                }
                let mut swapped = false;
                for day in 0..p.len_days() {
                    if p.grid[max_e][day] != shift
                        || p.grid[min_e][day] != ShiftType::Workday
                    {
                        continue;
                    }
                    let changes: Vec<Change> =
                        vec![(max_e, day, ShiftType::Workday), (min_e, day, shift)];
                    if p.try_swap(&changes, CwCap::Strict, |_| true) {
                        swapped = true;
                        break;
                    }
                }
                if !swapped {
                    break;
                }
            }
        }
    }
}

/// Pull every employee's working total back to their norm.
///
/// Surplus days are dropped walking backwards from month end; deficits are
/// filled walking forward, isolated off-days first for flexible employees.
pub(super) fn target_adjustment_pass(p: &mut Pipeline<'_>) {
    for emp in 0..p.employees.len() {
        let target = p.targets[emp];
        let mut total = p.total_working(emp);

        while total > target {
            if !shed_one_workday(p, emp) {
                break;
            }
            total -= 1;
        }
        while total < target {
            if !add_one_workday(p, emp) {
                break;
            }
            total += 1;
        }
    }
}

fn shed_one_workday(p: &mut Pipeline<'_>, emp: usize) -> bool {
    let e = &p.employees[emp];
    let flexible_full_time =
        e.schedule_type == ScheduleType::Flexible && e.workload_pct == 100;

    for day in (0..p.len_days()).rev() {
        if p.grid[emp][day] != ShiftType::Workday || p.is_holiday[day] || p.is_pinned(emp, day) {
            continue;
        }
        let ok = p.try_swap(&[(emp, day, ShiftType::DayOff)], CwCap::Strict, |p| {
            if !flexible_full_time {
                return true;
            }
            // Dropping a mid-run day must not leave work fragments shorter
            // than the minimum.
            side_runs_long_enough(p, emp, day)
        });
        if ok {
            return true;
        }
    }
    false
}

fn add_one_workday(p: &mut Pipeline<'_>, emp: usize) -> bool {
    let flexible = p.employees[emp].schedule_type == ScheduleType::Flexible;

    let mut candidates: Vec<usize> = Vec::new();
    if flexible {
        candidates.extend(p.isolated_off_days(emp));
    }
    candidates.extend(0..p.len_days());

    for day in candidates {
        if p.grid[emp][day] != ShiftType::DayOff || p.is_pinned(emp, day) {
            continue;
        }
        if !flexible && p.is_holiday[day] {
            continue;
        }
        if p.try_swap(&[(emp, day, ShiftType::Workday)], CwCap::Strict, |_| true) {
            return true;
        }
    }
    false
}

fn side_runs_long_enough(p: &Pipeline<'_>, emp: usize, day: usize) -> bool {
    let row = &p.grid[emp];
    let mut left = 0u32;
    let mut i = day;
    while i > 0 && row[i - 1].is_working() {
        left += 1;
        i -= 1;
    }
    let mut right = 0u32;
    let mut j = day;
    while j + 1 < row.len() && row[j + 1].is_working() {
        right += 1;
        j += 1;
    }
    (left == 0 || left >= MIN_WORK_BETWEEN_OFFS) && (right == 0 || right >= MIN_WORK_BETWEEN_OFFS)
}

fn flexible_duty(p: &Pipeline<'_>, city: City) -> Vec<usize> {
    p.employees
        .iter()
        .enumerate()
        .filter(|(_, e)| {
            e.city == city && e.on_duty && e.schedule_type == ScheduleType::Flexible
        })
        .map(|(i, _)| i)
        .collect()
}

/// Employees that compete for the same mandatory shift under the same
/// restrictions. Restricted profiles form their own cohort so a morning-only
/// fixture is never "balanced" against the open rotation.
fn eligibility_cohorts(p: &Pipeline<'_>, shift: ShiftType) -> Vec<Vec<usize>> {
    let mut cohorts: Vec<((City, bool, bool, bool), Vec<usize>)> = Vec::new();
    for (i, e) in p.employees.iter().enumerate() {
        if !e.duty_shift_allowed(shift) {
            continue;
        }
        let key = (e.city, e.morning_only, e.evening_only, e.always_on_duty);
        match cohorts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(i),
            None => cohorts.push((key, vec![i])),
        }
    }
    cohorts.into_iter().map(|(_, members)| members).collect()
}

fn extreme<F>(cohort: &[usize], count: F, max: bool) -> (usize, u32)
where
    F: Fn(usize) -> u32,
{
    let mut best = cohort[0];
    let mut best_c = count(best);
    for &e in &cohort[1..] {
        let c = count(e);
        if (max && c > best_c) || (!max && c < best_c) {
            best = e;
            best_c = c;
        }
    }
    (best, best_c)
}
