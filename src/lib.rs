#![forbid(unsafe_code)]
//! Duty roster — monthly 24/7 on-call schedule generator (local, no DB).
//!
//! - Two-city coverage: morning/evening in Moscow, night in Khabarovsk.
//! - Greedy day-by-day assignment with bounded backtracking.
//! - Deterministic: a seeded RNG is the only source of variation.
//! - Fairness repairs as a fixed post-processing pipeline.
//! - CSV/ICS/JSON exports; the production calendar comes from isdayoff.ru.

pub mod calendar;
pub mod export;
pub mod io;
pub mod model;
pub mod scheduler;
pub mod stats;

pub use calendar::CalendarError;
pub use model::{
    collect_config_issues, CarryOverState, City, Config, DaySchedule, Employee,
    PinnedAssignment, Schedule, ScheduleType, ShiftType, VacationPeriod,
};
pub use scheduler::{generate_schedule, EmployeeState, ScheduleError};
pub use stats::{compute_stats, EmployeeStats};
