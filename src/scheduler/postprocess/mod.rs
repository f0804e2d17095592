mod balance;
mod isolated;

use std::collections::{BTreeSet, HashSet};

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::calendar;
use crate::model::{Config, DaySchedule, Employee, ScheduleType, ShiftType};

use super::eligibility::{max_cw, max_cw_postprocess};
use super::types::MAX_CONSECUTIVE_OFF;

/// Upper bound on the repair loop of any single pass.
const MAX_PASS_ROUNDS: usize = 64;

/// Which consecutive-working cap a proposal is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CwCap {
    /// The greedy-phase cap (`max_cw`).
    Strict,
    /// The repair tolerance (`max_cw_postprocess`, one extra day for
    /// flexible duty employees).
    Relaxed,
}

/// One proposed cell rewrite.
pub(super) type Change = (usize, usize, ShiftType); // (employee, day, shift)

/// The fully built month as an employee x day grid, plus everything needed to
/// re-validate a proposal.
pub(super) struct Pipeline<'a> {
    pub employees: &'a [Employee],
    pub holidays: &'a BTreeSet<NaiveDate>,
    pub dates: Vec<NaiveDate>,
    pub is_holiday: Vec<bool>,
    pub grid: Vec<Vec<ShiftType>>,
    pub targets: Vec<u32>,
    pinned: HashSet<(usize, usize)>,
    carry_work: Vec<u32>,
    carry_off: Vec<u32>,
    carry_last: Vec<Option<ShiftType>>,
}

/// Run the full repair pipeline over the freshly built days.
///
/// The pass order is fixed; `trim_long_off_blocks` deliberately leaves a
/// working-day surplus that the second `target_adjustment_pass` absorbs.
pub(crate) fn run(config: &Config, holidays: &BTreeSet<NaiveDate>, days: &mut Vec<DaySchedule>) {
    let mut p = Pipeline::from_days(config, holidays, days);

    balance::balance_weekend_work(&mut p);
    balance::balance_duty_shifts(&mut p);
    balance::target_adjustment_pass(&mut p);
    isolated::trim_long_off_blocks(&mut p);
    balance::target_adjustment_pass(&mut p);
    isolated::minimize_isolated_off(&mut p);
    isolated::break_evening_isolated_pattern(&mut p);
    isolated::minimize_isolated_off(&mut p);
    isolated::equalize_isolated_off(&mut p);
    isolated::minimize_isolated_off(&mut p);

    *days = p.into_days();
}

impl<'a> Pipeline<'a> {
    fn from_days(
        config: &'a Config,
        holidays: &'a BTreeSet<NaiveDate>,
        days: &[DaySchedule],
    ) -> Self {
        let employees = config.employees.as_slice();
        let dates: Vec<NaiveDate> = days.iter().map(|d| d.date).collect();
        let is_holiday: Vec<bool> = days.iter().map(|d| d.is_holiday).collect();

        let grid: Vec<Vec<ShiftType>> = employees
            .iter()
            .map(|e| {
                days.iter()
                    .map(|d| d.shift_of(&e.name).unwrap_or(ShiftType::DayOff))
                    .collect()
            })
            .collect();

        let production = calendar::production_days(config.year, config.month, holidays);
        let targets: Vec<u32> = employees
            .iter()
            .map(|e| {
                let target = super::state::target_working_days(production, e.workload_pct);
                let vacation = super::state::vacation_business_days(e, config.year, config.month);
                target.saturating_sub(vacation)
            })
            .collect();

        let pinned: HashSet<(usize, usize)> = config
            .pins
            .iter()
            .filter_map(|pin| {
                let emp = employees.iter().position(|e| e.name == pin.employee_name)?;
                let day = dates.iter().position(|d| *d == pin.date)?;
                Some((emp, day))
            })
            .collect();

        let mut carry_work = vec![0u32; employees.len()];
        let mut carry_off = vec![0u32; employees.len()];
        let mut carry_last = vec![None; employees.len()];
        for carry in &config.carry_over {
            if let Some(i) = employees.iter().position(|e| e.name == carry.employee_name) {
                carry_work[i] = carry.consecutive_working;
                carry_off[i] = carry.consecutive_off;
                carry_last[i] = carry.last_shift;
            }
        }

        Self {
            employees,
            holidays,
            dates,
            is_holiday,
            grid,
            targets,
            pinned,
            carry_work,
            carry_off,
            carry_last,
        }
    }

    fn into_days(self) -> Vec<DaySchedule> {
        let mut days: Vec<DaySchedule> = self
            .dates
            .iter()
            .zip(&self.is_holiday)
            .map(|(date, holiday)| DaySchedule::new(*date, *holiday))
            .collect();
        for (emp_idx, e) in self.employees.iter().enumerate() {
            for (day_idx, shift) in self.grid[emp_idx].iter().enumerate() {
                days[day_idx].bucket_mut(*shift).push(e.name.clone());
            }
        }
        days
    }

    pub fn len_days(&self) -> usize {
        self.dates.len()
    }

    pub fn is_pinned(&self, emp: usize, day: usize) -> bool {
        self.pinned.contains(&(emp, day))
    }

    pub fn total_working(&self, emp: usize) -> u32 {
        self.grid[emp].iter().filter(|s| s.is_working()).count() as u32
    }

    /// Weekend/holiday days the employee works.
    pub fn weekend_work(&self, emp: usize) -> u32 {
        self.grid[emp]
            .iter()
            .enumerate()
            .filter(|(d, s)| self.is_holiday[*d] && s.is_working())
            .count() as u32
    }

    pub fn shift_total(&self, emp: usize, shift: ShiftType) -> u32 {
        self.grid[emp].iter().filter(|s| **s == shift).count() as u32
    }

    /// A day-off whose in-month neighbours are both working days.
    pub fn is_isolated_off(&self, emp: usize, day: usize) -> bool {
        if self.grid[emp][day] != ShiftType::DayOff {
            return false;
        }
        let left_working = day > 0 && self.grid[emp][day - 1].is_working();
        let right_working =
            day + 1 < self.len_days() && self.grid[emp][day + 1].is_working();
        left_working && right_working
    }

    pub fn isolated_off_count(&self, emp: usize) -> u32 {
        (0..self.len_days())
            .filter(|&d| self.is_isolated_off(emp, d))
            .count() as u32
    }

    pub fn isolated_off_days(&self, emp: usize) -> Vec<usize> {
        (0..self.len_days())
            .filter(|&d| self.is_isolated_off(emp, d))
            .collect()
    }

    /// Isolated off-days locked behind the employee's own evening shift.
    pub fn evening_locked_count(&self, emp: usize) -> u32 {
        (1..self.len_days())
            .filter(|&d| {
                self.grid[emp][d - 1] == ShiftType::Evening && self.is_isolated_off(emp, d)
            })
            .count() as u32
    }

    /// Length the work run would have if `day` held a working cell.
    pub fn work_run_if_added(&self, emp: usize, day: usize) -> u32 {
        let row = &self.grid[emp];
        let mut start = day;
        while start > 0 && row[start - 1].is_working() {
            start -= 1;
        }
        let mut end = day;
        while end + 1 < row.len() && row[end + 1].is_working() {
            end += 1;
        }
        let mut run = (end - start + 1) as u32;
        if start == 0 {
            run += self.carry_work[emp];
        }
        run
    }

    fn cw_cap_for(&self, emp: usize, cap: CwCap) -> u32 {
        match cap {
            CwCap::Strict => max_cw(&self.employees[emp]),
            CwCap::Relaxed => max_cw_postprocess(&self.employees[emp]),
        }
    }

    /// Whether the employee could in principle work this date; off cells on
    /// dates failing this are forced and exempt from the off-run limit.
    fn workable_date(&self, emp: usize, day: usize) -> bool {
        let e = &self.employees[emp];
        let date = self.dates[day];
        if e.is_blocked(date) {
            return false;
        }
        if e.days_off_weekly
            .contains(&(date.weekday().num_days_from_monday() as u8))
        {
            return false;
        }
        !(e.schedule_type == ScheduleType::FiveTwo && self.is_holiday[day])
    }

    /// A single working cell is placeable here at all.
    fn cell_legal(&self, emp: usize, day: usize, shift: ShiftType) -> bool {
        let e = &self.employees[emp];
        match shift {
            ShiftType::Morning | ShiftType::Evening | ShiftType::Night => {
                e.duty_shift_allowed(shift) && self.workable_date(emp, day)
            }
            ShiftType::Workday => !e.duty_only() && self.workable_date(emp, day),
            ShiftType::DayOff => true,
            ShiftType::Vacation => e.is_on_vacation(self.dates[day]),
        }
    }

    /// Re-validate an employee's row after a proposal.
    ///
    /// Work and off runs are only enforced for runs touching a changed day:
    /// the greedy phase legitimately leaves long off blocks (trimmed later),
    /// and those must not veto unrelated repairs.
    fn row_ok(&self, emp: usize, changed_days: &[usize], cap: CwCap) -> bool {
        let row = &self.grid[emp];
        let e = &self.employees[emp];

        // Rest transitions, the whole row.
        let mut prev = self.carry_last[emp];
        for &cell in row.iter() {
            match prev {
                Some(ShiftType::Evening) => {
                    if matches!(cell, ShiftType::Morning | ShiftType::Workday | ShiftType::Night) {
                        return false;
                    }
                }
                Some(ShiftType::Night) => {
                    if cell.is_working() {
                        return false;
                    }
                }
                _ => {}
            }
            prev = Some(cell);
        }

        // Monthly caps, the whole row.
        for shift in [ShiftType::Morning, ShiftType::Evening, ShiftType::Night] {
            if let Some(limit) = e.shift_cap(shift) {
                if self.shift_total(emp, shift) > limit {
                    return false;
                }
            }
        }

        for &day in changed_days {
            let cell = row[day];
            if !self.cell_legal(emp, day, cell) {
                return false;
            }
            if cell.is_working() {
                let run = self.work_run_if_added(emp, day);
                // The relaxed tolerance never stretches a run that continues
                // the previous month's streak.
                let continues_carry =
                    self.carry_work[emp] > 0 && row[..day].iter().all(|s| s.is_working());
                let cap_here = if continues_carry {
                    max_cw(e)
                } else {
                    self.cw_cap_for(emp, cap)
                };
                if run > cap_here {
                    return false;
                }
            } else if cell == ShiftType::DayOff {
                if self.countable_off_run(emp, day) > MAX_CONSECUTIVE_OFF {
                    return false;
                }
            }
        }
        true
    }

    /// Length of the schedulable off run through `day`; forced off days
    /// (vacation, blackout, weekly off, 5/2 holidays) terminate a run.
    fn countable_off_run(&self, emp: usize, day: usize) -> u32 {
        let row = &self.grid[emp];
        let countable =
            |i: usize| row[i] == ShiftType::DayOff && self.workable_date(emp, i);
        if !countable(day) {
            return 0;
        }
        let mut run = 1u32;
        let mut i = day;
        while i > 0 && countable(i - 1) {
            run += 1;
            i -= 1;
        }
        if i == 0 {
            run += self.carry_off[emp];
        }
        let mut j = day;
        while j + 1 < row.len() && countable(j + 1) {
            run += 1;
            j += 1;
        }
        run
    }

    /// Every changed day still covers the three mandatory shifts exactly once
    /// and keeps groups apart.
    fn day_ok(&self, day: usize) -> bool {
        for shift in [ShiftType::Morning, ShiftType::Evening, ShiftType::Night] {
            let holders = (0..self.employees.len())
                .filter(|&i| self.grid[i][day] == shift)
                .count();
            if holders != 1 {
                return false;
            }
        }
        for (i, e) in self.employees.iter().enumerate() {
            let Some(group) = e.group.as_deref() else { continue };
            let shift = self.grid[i][day];
            if !shift.is_working() {
                continue;
            }
            let clash = self.employees.iter().enumerate().any(|(j, other)| {
                j != i && other.group.as_deref() == Some(group) && self.grid[j][day] == shift
            });
            if clash {
                return false;
            }
        }
        true
    }

    /// Apply a proposal, re-check hard constraints and the pass-specific
    /// acceptance metric, revert in full when anything fails.
    pub fn try_swap<F>(&mut self, changes: &[Change], cap: CwCap, accept: F) -> bool
    where
        F: Fn(&Self) -> bool,
    {
        if changes
            .iter()
            .any(|&(emp, day, _)| self.is_pinned(emp, day))
        {
            return false;
        }

        let backup: Vec<Change> = changes
            .iter()
            .map(|&(emp, day, _)| (emp, day, self.grid[emp][day]))
            .collect();
        for &(emp, day, shift) in changes {
            self.grid[emp][day] = shift;
        }

        let mut emps: Vec<usize> = changes.iter().map(|c| c.0).collect();
        emps.sort_unstable();
        emps.dedup();
        let mut days: Vec<usize> = changes.iter().map(|c| c.1).collect();
        days.sort_unstable();
        days.dedup();

        let hard_ok = emps.iter().all(|&emp| {
            let changed: Vec<usize> = changes
                .iter()
                .filter(|c| c.0 == emp)
                .map(|c| c.1)
                .collect();
            self.row_ok(emp, &changed, cap)
        }) && days.iter().all(|&d| self.day_ok(d));

        if hard_ok && accept(self) {
            debug!(?changes, "repair applied");
            true
        } else {
            for (emp, day, shift) in backup {
                self.grid[emp][day] = shift;
            }
            false
        }
    }
}

pub(super) const fn pass_rounds() -> usize {
    MAX_PASS_ROUNDS
}
