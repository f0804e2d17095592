mod day;
mod eligibility;
mod postprocess;
mod select;
mod state;
mod types;

pub use eligibility::{max_cw, max_cw_postprocess};
pub use state::{target_working_days, vacation_business_days, EmployeeState};
pub use types::{
    ScheduleError, MAX_BACKTRACK_ATTEMPTS, MAX_BACKTRACK_DAYS, MAX_CONSECUTIVE_OFF,
    MAX_CONSECUTIVE_WORKING, MIN_WORK_BETWEEN_OFFS,
};

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::calendar;
use crate::model::{Config, DaySchedule, Schedule};

use day::DayContext;

/// Generate the monthly roster.
///
/// Deterministic: for a fixed `(config, holidays)` pair the output is
/// identical across runs. The seeded RNG is the only source of variation and
/// is re-seeded deterministically on every backtrack.
pub fn generate_schedule(
    config: &Config,
    holidays: &BTreeSet<NaiveDate>,
) -> Result<Schedule, ScheduleError> {
    config.validate()?;

    let all_days = calendar::month_days(config.year, config.month);
    let production = calendar::production_days(config.year, config.month, holidays);
    info!(
        month = config.month,
        year = config.year,
        production_days = production,
        employees = config.employees.len(),
        "generating schedule"
    );

    let ctx = DayContext {
        employees: &config.employees,
        holidays,
        pins: &config.pins,
    };

    let mut states = state::initial_states(config, holidays);
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let mut days: Vec<DaySchedule> = Vec::with_capacity(all_days.len());
    let mut snapshots: Vec<Vec<EmployeeState>> = Vec::with_capacity(all_days.len());
    let mut day_idx = 0usize;
    let mut total_backtracks = 0u32;

    while day_idx < all_days.len() {
        let day = all_days[day_idx];
        let next_day = all_days.get(day_idx + 1).copied();
        let remaining = (all_days.len() - day_idx) as u32;
        let saved = states.clone();

        match day::build_day(&ctx, day, next_day, &mut states, &mut rng, remaining) {
            Ok(ds) => {
                days.push(ds);
                snapshots.push(saved);
                day_idx += 1;
            }
            Err(gap) => {
                warn!(day = %gap.date, shift = gap.shift.label(), "coverage gap, backtracking");
                total_backtracks += 1;
                if total_backtracks > MAX_BACKTRACK_ATTEMPTS || snapshots.is_empty() {
                    return Err(ScheduleError::Infeasible {
                        date: gap.date,
                        shift: gap.shift,
                        attempts: total_backtracks,
                        reason: gap.reason,
                    });
                }
                let steps = MAX_BACKTRACK_DAYS.min(snapshots.len());
                for _ in 0..steps {
                    states = snapshots.pop().expect("snapshot per built day");
                    days.pop();
                    day_idx -= 1;
                }
                rng = ChaCha8Rng::seed_from_u64(
                    config
                        .seed
                        .wrapping_add(u64::from(total_backtracks) * 1000)
                        .wrapping_add(day_idx as u64),
                );
                debug!(day_idx, total_backtracks, "rewound {steps} days");
            }
        }
    }

    postprocess::run(config, holidays, &mut days);

    let uncovered: Vec<NaiveDate> = days
        .iter()
        .filter(|d| !d.is_covered())
        .map(|d| d.date)
        .collect();
    if let Some(&date) = uncovered.first() {
        // Unreachable unless a pass drops a mandatory assignee; kept as a
        // hard audit rather than a silent bad roster.
        return Err(ScheduleError::Infeasible {
            date,
            shift: crate::model::ShiftType::Morning,
            attempts: total_backtracks,
            reason: "day left uncovered".to_string(),
        });
    }

    info!(
        days = days.len(),
        backtracks = total_backtracks,
        "schedule generated"
    );

    Ok(Schedule {
        config: config.clone(),
        holidays: holidays.clone(),
        days,
    })
}

/// Re-run the repair pipeline over an already generated schedule.
///
/// Generation runs it once; this entry point normalises schedules that were
/// edited by hand after export. Pinned cells stay untouched.
pub fn reapply_repairs(schedule: &mut Schedule) {
    let mut days = std::mem::take(&mut schedule.days);
    postprocess::run(&schedule.config, &schedule.holidays, &mut days);
    schedule.days = days;
}
