use crate::model::{City, ScheduleType, ShiftType};

use super::{pass_rounds, Change, CwCap, Pipeline};

/// Longest acceptable rest block before trimming kicks in.
const LONG_OFF_RUN: usize = 4;
/// Most isolated off-days an employee may absorb when taking over an evening.
const MAX_ABSORBED_ISOLATED: u32 = 2;

/// Break up rest blocks of four days and more for flexible duty employees.
///
/// Preferably the freed day is paired with an isolated off-day elsewhere in
/// the month (two-point swap); otherwise the block is trimmed alone and the
/// surplus is settled by the following target adjustment.
pub(super) fn trim_long_off_blocks(p: &mut Pipeline<'_>) {
    for emp in 0..p.employees.len() {
        let e = &p.employees[emp];
        if e.schedule_type != ScheduleType::Flexible || !e.on_duty || e.duty_only() {
            continue;
        }
        for _ in 0..pass_rounds() {
            let mut progressed = false;
            for run in long_off_runs(p, emp) {
                for trim_idx in run.clone() {
                    if p.is_pinned(emp, trim_idx) || p.grid[emp][trim_idx] != ShiftType::DayOff {
                        continue;
                    }
                    if pair_with_isolated(p, emp, trim_idx, &run) {
                        progressed = true;
                        break;
                    }
                    if p.try_swap(&[(emp, trim_idx, ShiftType::Workday)], CwCap::Strict, |_| true)
                    {
                        progressed = true;
                        break;
                    }
                }
            }
            if !progressed {
                break;
            }
        }
    }
}

fn long_off_runs(p: &Pipeline<'_>, emp: usize) -> Vec<std::ops::Range<usize>> {
    let row = &p.grid[emp];
    let mut runs = Vec::new();
    let mut start = None;
    for day in 0..=row.len() {
        let off = day < row.len() && row[day] == ShiftType::DayOff;
        match (start, off) {
            (None, true) => start = Some(day),
            (Some(s), false) => {
                if day - s >= LONG_OFF_RUN {
                    runs.push(s..day);
                }
                start = None;
            }
            _ => {}
        }
    }
    runs
}

/// Two-point swap: trim the block and move the day next to an isolated off so
/// the latter becomes paired.
fn pair_with_isolated(
    p: &mut Pipeline<'_>,
    emp: usize,
    trim_idx: usize,
    run: &std::ops::Range<usize>,
) -> bool {
    let isolated: Vec<usize> = p
        .isolated_off_days(emp)
        .into_iter()
        .filter(|d| !run.contains(d))
        .collect();
    for iso in isolated {
        for nb in neighbours(iso, p.len_days()) {
            if p.grid[emp][nb] != ShiftType::Workday || p.is_pinned(emp, nb) {
                continue;
            }
            let before = p.isolated_off_count(emp);
            let changes: Vec<Change> = vec![
                (emp, trim_idx, ShiftType::Workday),
                (emp, nb, ShiftType::DayOff),
            ];
            if p.try_swap(&changes, CwCap::Strict, |p| p.isolated_off_count(emp) < before) {
                return true;
            }
        }
    }
    false
}

/// Eliminate isolated off-days greedily until no more progress can be made.
pub(super) fn minimize_isolated_off(p: &mut Pipeline<'_>) {
    for _ in 0..pass_rounds() {
        let mut progressed = false;
        for emp in 0..p.employees.len() {
            if !p.employees[emp].on_duty {
                continue;
            }
            for isolated_idx in p.isolated_off_days(emp) {
                if extend_and_compensate(p, emp, isolated_idx) {
                    progressed = true;
                    break;
                }
                if p.employees[emp].schedule_type == ScheduleType::Flexible
                    && fill_and_repair(p, emp, isolated_idx)
                {
                    progressed = true;
                    break;
                }
            }
        }
        if !progressed {
            break;
        }
    }
}

/// Primary path: free one working neighbour to pair the off-day, and give a
/// compensating workday back somewhere else.
fn extend_and_compensate(p: &mut Pipeline<'_>, emp: usize, isolated_idx: usize) -> bool {
    let before = p.isolated_off_count(emp);
    for extend_idx in neighbours(isolated_idx, p.len_days()) {
        if p.grid[emp][extend_idx] != ShiftType::Workday || p.is_pinned(emp, extend_idx) {
            continue;
        }
        for comp_idx in 0..p.len_days() {
            if comp_idx == isolated_idx
                || p.grid[emp][comp_idx] != ShiftType::DayOff
                || p.is_pinned(emp, comp_idx)
            {
                continue;
            }
            let changes: Vec<Change> = vec![
                (emp, extend_idx, ShiftType::DayOff),
                (emp, comp_idx, ShiftType::Workday),
            ];
            if p.try_swap(&changes, CwCap::Relaxed, |p| {
                p.isolated_off_count(emp) < before
            }) {
                return true;
            }
        }
    }
    false
}

/// Flexible-only fallback: work the isolated day itself and spend the freed
/// off-day pairing another isolated one. Total rest is preserved and two
/// isolated off-days disappear together.
fn fill_and_repair(p: &mut Pipeline<'_>, emp: usize, isolated_idx: usize) -> bool {
    if p.is_pinned(emp, isolated_idx) {
        return false;
    }
    let before = p.isolated_off_count(emp);
    let others: Vec<usize> = p
        .isolated_off_days(emp)
        .into_iter()
        .filter(|&d| d != isolated_idx)
        .collect();
    for target_idx in others {
        for nb in neighbours(target_idx, p.len_days()) {
            if p.grid[emp][nb] != ShiftType::Workday || p.is_pinned(emp, nb) {
                continue;
            }
            let changes: Vec<Change> = vec![
                (emp, isolated_idx, ShiftType::Workday),
                (emp, nb, ShiftType::DayOff),
            ];
            if p.try_swap(&changes, CwCap::Relaxed, |p| {
                p.isolated_off_count(emp) + 1 < before
            }) {
                return true;
            }
        }
    }
    false
}

/// Untangle the evening-into-forced-rest idiom by handing the evening to a
/// colleague who is already working that day.
pub(super) fn break_evening_isolated_pattern(p: &mut Pipeline<'_>) {
    let moscow_duty: Vec<usize> = p
        .employees
        .iter()
        .enumerate()
        .filter(|(_, e)| e.city == City::Moscow && e.on_duty)
        .map(|(i, _)| i)
        .collect();

    for &a in &moscow_duty {
        for day in 0..p.len_days().saturating_sub(1) {
            if p.grid[a][day] != ShiftType::Evening || !p.is_isolated_off(a, day + 1) {
                continue;
            }
            let locked_before = p.evening_locked_count(a);
            let isolated_before = p.isolated_off_count(a);

            for &b in &moscow_duty {
                if b == a || !p.employees[b].can_work_evening() {
                    continue;
                }
                let b_shift = p.grid[b][day];
                if !matches!(b_shift, ShiftType::Morning | ShiftType::Workday) {
                    continue;
                }
                // A inherits B's shift, so A is no longer resting after an
                // evening on the following day.
                let changes: Vec<Change> =
                    vec![(a, day, b_shift), (b, day, ShiftType::Evening)];
                let accepted = p.try_swap(&changes, CwCap::Relaxed, |p| {
                    p.evening_locked_count(a) < locked_before
                        && p.isolated_off_count(a) <= isolated_before
                        && p.isolated_off_count(b) <= MAX_ABSORBED_ISOLATED
                });
                if accepted {
                    break;
                }
            }
        }
    }
}

/// Spread isolated off-days evenly among flexible duty employees of a city:
/// stop once the max-min gap is one or the worst case is down to two.
pub(super) fn equalize_isolated_off(p: &mut Pipeline<'_>) {
    for city in [City::Moscow, City::Khabarovsk] {
        let cohort: Vec<usize> = p
            .employees
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                e.city == city && e.on_duty && e.schedule_type == ScheduleType::Flexible
            })
            .map(|(i, _)| i)
            .collect();
        if cohort.len() < 2 {
            continue;
        }
        for _ in 0..pass_rounds() {
            let max_e = *cohort
                .iter()
                .max_by_key(|&&e| p.isolated_off_count(e))
                .expect("non-empty cohort");
            let min_e = *cohort
                .iter()
                .min_by_key(|&&e| p.isolated_off_count(e))
                .expect("non-empty cohort");
            let max_c = p.isolated_off_count(max_e);
            let min_c = p.isolated_off_count(min_e);
            if max_c.saturating_sub(min_c) <= 1 || max_c <= 2 {
                break;
            }
            if !shift_isolated_between(p, max_e, min_e, max_c) {
                break;
            }
        }
    }
}

/// Move one isolated off-day from the worst-off employee to the best-off one.
fn shift_isolated_between(p: &mut Pipeline<'_>, max_e: usize, min_e: usize, max_c: u32) -> bool {
    for iso in p.isolated_off_days(max_e) {
        if p.is_pinned(max_e, iso) {
            continue;
        }
        for day in 0..p.len_days() {
            if p.grid[min_e][day] != ShiftType::Workday || p.is_pinned(min_e, day) {
                continue;
            }
            let changes: Vec<Change> = vec![
                (max_e, iso, ShiftType::Workday),
                (min_e, day, ShiftType::DayOff),
            ];
            let accepted = p.try_swap(&changes, CwCap::Relaxed, |p| {
                p.isolated_off_count(max_e) < max_c && p.isolated_off_count(min_e) < max_c
            });
            if accepted {
                return true;
            }
        }
    }
    false
}

fn neighbours(day: usize, len: usize) -> Vec<usize> {
    let mut out = Vec::with_capacity(2);
    if day > 0 {
        out.push(day - 1);
    }
    if day + 1 < len {
        out.push(day + 1);
    }
    out
}
