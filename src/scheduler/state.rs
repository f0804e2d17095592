use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::calendar;
use crate::model::{Config, Employee, ShiftType};

/// Running counters for one employee, valid for a single generation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmployeeState {
    pub consecutive_working: u32,
    pub consecutive_off: u32,
    pub last_shift: Option<ShiftType>,
    pub night_count: u32,
    pub morning_count: u32,
    pub evening_count: u32,
    pub workday_count: u32,
    pub total_working: u32,
    pub target_working_days: u32,
    pub vacation_days: u32,
}

impl EmployeeState {
    pub fn shift_count(&self, shift: ShiftType) -> u32 {
        match shift {
            ShiftType::Night => self.night_count,
            ShiftType::Morning => self.morning_count,
            ShiftType::Evening => self.evening_count,
            ShiftType::Workday => self.workday_count,
            _ => 0,
        }
    }

    /// Fold one day's assignment into the counters.
    pub fn record(&mut self, shift: ShiftType) {
        if shift.is_working() {
            self.consecutive_working += 1;
            self.consecutive_off = 0;
            self.total_working += 1;
        } else {
            self.consecutive_off += 1;
            self.consecutive_working = 0;
        }
        self.last_shift = Some(shift);
        match shift {
            ShiftType::Morning => self.morning_count += 1,
            ShiftType::Evening => self.evening_count += 1,
            ShiftType::Night => self.night_count += 1,
            ShiftType::Workday => self.workday_count += 1,
            _ => {}
        }
    }

    /// Monthly norm reduced by vacation business days.
    pub fn effective_target(&self) -> u32 {
        self.target_working_days.saturating_sub(self.vacation_days)
    }

    /// The employee still owes working days this month.
    pub fn needs_more_work(&self, remaining_days: u32) -> bool {
        if remaining_days == 0 {
            return false;
        }
        self.total_working < self.effective_target()
    }
}

/// Monthly working-day norm: `round(production_days * workload_pct / 100)`.
pub fn target_working_days(production_days: u32, workload_pct: u8) -> u32 {
    ((f64::from(production_days) * f64::from(workload_pct)) / 100.0).round() as u32
}

/// Business days of the month the employee spends on vacation.
pub fn vacation_business_days(emp: &Employee, year: i32, month: u32) -> u32 {
    calendar::month_days(year, month)
        .into_iter()
        .filter(|d| !calendar::is_weekend(*d) && emp.is_on_vacation(*d))
        .count() as u32
}

/// Initial states for every employee: norms plus previous-month carry-over.
pub fn initial_states(config: &Config, holidays: &BTreeSet<NaiveDate>) -> Vec<EmployeeState> {
    let production = calendar::production_days(config.year, config.month, holidays);
    config
        .employees
        .iter()
        .map(|emp| {
            let mut state = EmployeeState {
                target_working_days: target_working_days(production, emp.workload_pct),
                vacation_days: vacation_business_days(emp, config.year, config.month),
                ..EmployeeState::default()
            };
            if let Some(carry) = config
                .carry_over
                .iter()
                .find(|c| c.employee_name == emp.name)
            {
                state.consecutive_working = carry.consecutive_working;
                state.consecutive_off = carry.consecutive_off;
                state.last_shift = carry.last_shift;
            }
            state
        })
        .collect()
}
