use chrono::NaiveDate;
use thiserror::Error;

use crate::model::ShiftType;

/// Hard limit on consecutive working days during the greedy phase.
pub const MAX_CONSECUTIVE_WORKING: u32 = 5;
/// Hard limit on consecutive day-off cells.
pub const MAX_CONSECUTIVE_OFF: u32 = 3;
/// Shortest acceptable work run between two off blocks for flexible full-timers.
pub const MIN_WORK_BETWEEN_OFFS: u32 = 3;
/// How many already-built days a single backtrack unwinds.
pub const MAX_BACKTRACK_DAYS: usize = 3;
/// Total backtrack budget for one generation.
pub const MAX_BACKTRACK_ATTEMPTS: u32 = 10;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("invalid roster: {0}")]
    InvalidRoster(String),
    #[error("invalid pin: {0}")]
    InvalidPin(String),
    #[error(
        "schedule infeasible: {shift} on {date} cannot be covered after {attempts} backtracks ({reason})"
    )]
    Infeasible {
        date: NaiveDate,
        shift: ShiftType,
        attempts: u32,
        reason: String,
    },
}

/// Internal build_day failure. Always caught by the backtracking loop; only
/// surfaces to the caller wrapped into [`ScheduleError::Infeasible`] once the
/// backtrack budget is spent.
#[derive(Debug, Clone)]
pub(crate) struct CoverageGap {
    pub date: NaiveDate,
    pub shift: ShiftType,
    pub reason: String,
}
