use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

use crate::calendar;
use crate::model::{Employee, ScheduleType, ShiftType};

use super::state::EmployeeState;
use super::types::MAX_CONSECUTIVE_WORKING;

pub fn is_weekend_or_holiday(day: NaiveDate, holidays: &BTreeSet<NaiveDate>) -> bool {
    calendar::is_weekend(day) || holidays.contains(&day)
}

/// Personal consecutive-working cap used by the greedy phase.
pub fn max_cw(emp: &Employee) -> u32 {
    emp.max_consecutive_working
        .unwrap_or(MAX_CONSECUTIVE_WORKING)
        .min(MAX_CONSECUTIVE_WORKING)
}

/// Post-processing tolerance: one extra day for flexible duty employees that
/// may take plain workdays; everyone else keeps the greedy cap.
pub fn max_cw_postprocess(emp: &Employee) -> u32 {
    if emp.schedule_type == ScheduleType::Flexible && emp.on_duty && !emp.duty_only() {
        max_cw(emp) + 1
    } else {
        max_cw(emp)
    }
}

/// The employee may work any shift on `day`.
pub fn can_work(
    emp: &Employee,
    state: &EmployeeState,
    day: NaiveDate,
    holidays: &BTreeSet<NaiveDate>,
) -> bool {
    if emp.is_blocked(day) {
        return false;
    }
    if state.consecutive_working >= max_cw(emp) {
        return false;
    }
    if emp.days_off_weekly.contains(&(day.weekday().num_days_from_monday() as u8)) {
        return false;
    }
    !(emp.schedule_type == ScheduleType::FiveTwo && is_weekend_or_holiday(day, holidays))
}

/// Yesterday ended at midnight: morning and workday are off the table.
pub fn resting_after_evening(state: &EmployeeState) -> bool {
    state.last_shift == Some(ShiftType::Evening)
}

/// Yesterday ended at 08:00: the whole day is rest.
pub fn resting_after_night(state: &EmployeeState) -> bool {
    state.last_shift == Some(ShiftType::Night)
}

/// The monthly cap for `shift` has been reached.
pub fn shift_cap_reached(emp: &Employee, state: &EmployeeState, shift: ShiftType) -> bool {
    match emp.shift_cap(shift) {
        Some(cap) => state.shift_count(shift) >= cap,
        None => false,
    }
}

/// Another member of the same group already holds `shift` today.
pub fn group_clash(
    employees: &[Employee],
    assigned: &[Option<ShiftType>],
    emp_idx: usize,
    shift: ShiftType,
) -> bool {
    let Some(group) = employees[emp_idx].group.as_deref() else {
        return false;
    };
    employees.iter().enumerate().any(|(j, other)| {
        j != emp_idx && other.group.as_deref() == Some(group) && assigned[j] == Some(shift)
    })
}
