use std::collections::BTreeSet;

use chrono::NaiveDate;
use rand_chacha::ChaCha8Rng;

use crate::model::{City, DaySchedule, Employee, PinnedAssignment, ScheduleType, ShiftType};

use super::eligibility::{
    can_work, group_clash, is_weekend_or_holiday, max_cw, resting_after_evening,
    resting_after_night, shift_cap_reached,
};
use super::select::{select_by_urgency, select_fair, select_for_mandatory};
use super::state::EmployeeState;
use super::types::{CoverageGap, MAX_CONSECUTIVE_OFF, MIN_WORK_BETWEEN_OFFS};

pub(crate) struct DayContext<'a> {
    pub employees: &'a [Employee],
    pub holidays: &'a BTreeSet<NaiveDate>,
    pub pins: &'a [PinnedAssignment],
}

/// Build one day of the roster and fold it into the employee states.
///
/// Fails with a [`CoverageGap`] when a mandatory shift has no eligible
/// candidate; the caller is expected to backtrack.
pub(crate) fn build_day(
    ctx: &DayContext<'_>,
    day: NaiveDate,
    next_day: Option<NaiveDate>,
    states: &mut [EmployeeState],
    rng: &mut ChaCha8Rng,
    remaining_days: u32,
) -> Result<DaySchedule, CoverageGap> {
    let employees = ctx.employees;
    let is_holiday = is_weekend_or_holiday(day, ctx.holidays);
    let mut assigned: Vec<Option<ShiftType>> = vec![None; employees.len()];

    // Pins override everything; validity was asserted up front.
    for pin in ctx.pins.iter().filter(|p| p.date == day) {
        if let Some(idx) = employees.iter().position(|e| e.name == pin.employee_name) {
            assigned[idx] = Some(pin.shift);
        }
    }

    reserve_always_on_duty(ctx, day, states, &mut assigned);

    // Night: Khabarovsk, exactly one.
    if !slot_taken(&assigned, ShiftType::Night) {
        let pool: Vec<usize> = (0..employees.len())
            .filter(|&i| {
                let e = &employees[i];
                assigned[i].is_none()
                    && e.city == City::Khabarovsk
                    && e.on_duty
                    && can_work(e, &states[i], day, ctx.holidays)
                    && !resting_after_evening(&states[i])
                    && !resting_after_night(&states[i])
                    && !shift_cap_reached(e, &states[i], ShiftType::Night)
                    && !group_clash(employees, &assigned, i, ShiftType::Night)
            })
            .collect();
        let pick = select_for_mandatory(
            &pool,
            employees,
            states,
            ShiftType::Night,
            remaining_days,
            rng,
            1,
        );
        match pick.first() {
            Some(&idx) => assigned[idx] = Some(ShiftType::Night),
            None => {
                return Err(CoverageGap {
                    date: day,
                    shift: ShiftType::Night,
                    reason: "no available Khabarovsk duty employee".to_string(),
                })
            }
        }
    }

    // Morning: Moscow, exactly one.
    if !slot_taken(&assigned, ShiftType::Morning) {
        let pool: Vec<usize> = (0..employees.len())
            .filter(|&i| morning_eligible(ctx, day, states, &assigned, i))
            .collect();
        let pick = pick_morning(ctx, day, states, &assigned, &pool, remaining_days, rng);
        match pick {
            Some(idx) => assigned[idx] = Some(ShiftType::Morning),
            None => {
                return Err(CoverageGap {
                    date: day,
                    shift: ShiftType::Morning,
                    reason: "no available Moscow duty employee".to_string(),
                })
            }
        }
    }

    // Evening: Moscow, exactly one. A prior evening allows another evening.
    if !slot_taken(&assigned, ShiftType::Evening) {
        let pool: Vec<usize> = (0..employees.len())
            .filter(|&i| evening_eligible(ctx, day, states, &assigned, i))
            .collect();
        let pick = pick_evening(employees, states, &pool, remaining_days, rng);
        match pick {
            Some(idx) => assigned[idx] = Some(ShiftType::Evening),
            None => {
                return Err(CoverageGap {
                    date: day,
                    shift: ShiftType::Evening,
                    reason: "no available evening-capable Moscow duty employee".to_string(),
                })
            }
        }
    }

    if !is_holiday {
        fill_moscow_workdays(ctx, day, next_day, states, &mut assigned, remaining_days, rng);
    }

    fill_khabarovsk(ctx, day, states, &mut assigned, remaining_days);

    // Remaining Moscow duty rest; non-duty follow the production calendar.
    for (i, e) in employees.iter().enumerate() {
        if assigned[i].is_some() {
            continue;
        }
        let shift = if e.is_on_vacation(day) {
            ShiftType::Vacation
        } else if !e.on_duty {
            if is_holiday
                || e.is_blocked(day)
                || !can_work(e, &states[i], day, ctx.holidays)
                || group_clash(employees, &assigned, i, ShiftType::Workday)
            {
                ShiftType::DayOff
            } else {
                ShiftType::Workday
            }
        } else {
            ShiftType::DayOff
        };
        assigned[i] = Some(shift);
    }

    apply_overrides(ctx, day, is_holiday, states, &mut assigned, remaining_days);

    // Commit: one bucket entry and one record() per employee, roster order.
    let mut ds = DaySchedule::new(day, is_holiday);
    for (i, e) in employees.iter().enumerate() {
        let shift = assigned[i].unwrap_or(ShiftType::DayOff);
        ds.bucket_mut(shift).push(e.name.clone());
        states[i].record(shift);
    }
    Ok(ds)
}

fn slot_taken(assigned: &[Option<ShiftType>], shift: ShiftType) -> bool {
    assigned.iter().any(|a| *a == Some(shift))
}

/// Employees that must never rest take their pinned-by-restriction shift
/// before the open selection rounds.
fn reserve_always_on_duty(
    ctx: &DayContext<'_>,
    day: NaiveDate,
    states: &[EmployeeState],
    assigned: &mut [Option<ShiftType>],
) {
    for (i, e) in ctx.employees.iter().enumerate() {
        if assigned[i].is_some() || !e.always_on_duty || !e.on_duty {
            continue;
        }
        if !can_work(e, &states[i], day, ctx.holidays) || resting_after_night(&states[i]) {
            continue;
        }
        if e.morning_only
            && !slot_taken(assigned, ShiftType::Morning)
            && !resting_after_evening(&states[i])
            && !shift_cap_reached(e, &states[i], ShiftType::Morning)
            && !group_clash(ctx.employees, assigned, i, ShiftType::Morning)
        {
            assigned[i] = Some(ShiftType::Morning);
        } else if e.evening_only
            && !slot_taken(assigned, ShiftType::Evening)
            && !shift_cap_reached(e, &states[i], ShiftType::Evening)
            && !group_clash(ctx.employees, assigned, i, ShiftType::Evening)
        {
            assigned[i] = Some(ShiftType::Evening);
        }
        // Unrestricted always-on-duty employees stay in the open pools and
        // are preferred there.
    }
}

fn morning_eligible(
    ctx: &DayContext<'_>,
    day: NaiveDate,
    states: &[EmployeeState],
    assigned: &[Option<ShiftType>],
    i: usize,
) -> bool {
    let e = &ctx.employees[i];
    assigned[i].is_none()
        && e.city == City::Moscow
        && e.on_duty
        && e.can_work_morning()
        && can_work(e, &states[i], day, ctx.holidays)
        && !resting_after_evening(&states[i])
        && !resting_after_night(&states[i])
        && !shift_cap_reached(e, &states[i], ShiftType::Morning)
        && !group_clash(ctx.employees, assigned, i, ShiftType::Morning)
}

fn evening_eligible(
    ctx: &DayContext<'_>,
    day: NaiveDate,
    states: &[EmployeeState],
    assigned: &[Option<ShiftType>],
    i: usize,
) -> bool {
    let e = &ctx.employees[i];
    assigned[i].is_none()
        && e.city == City::Moscow
        && e.on_duty
        && e.can_work_evening()
        && can_work(e, &states[i], day, ctx.holidays)
        && !resting_after_night(&states[i])
        && !shift_cap_reached(e, &states[i], ShiftType::Evening)
        && !group_clash(ctx.employees, assigned, i, ShiftType::Evening)
}

fn pick_morning(
    ctx: &DayContext<'_>,
    day: NaiveDate,
    states: &[EmployeeState],
    assigned: &[Option<ShiftType>],
    pool: &[usize],
    remaining_days: u32,
    rng: &mut ChaCha8Rng,
) -> Option<usize> {
    let employees = ctx.employees;

    let always: Vec<usize> = pool
        .iter()
        .copied()
        .filter(|&i| employees[i].always_on_duty)
        .collect();
    if !always.is_empty() {
        return select_fair(&always, employees, states, ShiftType::Morning, rng, 1)
            .first()
            .copied();
    }

    // Spend morning-only employees on the morning slot while somebody else
    // can still take the evening.
    let morning_only: Vec<usize> = pool
        .iter()
        .copied()
        .filter(|&i| employees[i].morning_only)
        .collect();
    if !morning_only.is_empty() {
        let evening_capable_elsewhere = (0..employees.len()).any(|j| {
            !morning_only.contains(&j) && evening_eligible(ctx, day, states, assigned, j)
        });
        if evening_capable_elsewhere {
            return select_fair(&morning_only, employees, states, ShiftType::Morning, rng, 1)
                .first()
                .copied();
        }
    }

    select_for_mandatory(
        pool,
        employees,
        states,
        ShiftType::Morning,
        remaining_days,
        rng,
        1,
    )
    .first()
    .copied()
}

fn pick_evening(
    employees: &[Employee],
    states: &[EmployeeState],
    pool: &[usize],
    remaining_days: u32,
    rng: &mut ChaCha8Rng,
) -> Option<usize> {
    let always: Vec<usize> = pool
        .iter()
        .copied()
        .filter(|&i| employees[i].always_on_duty)
        .collect();
    if !always.is_empty() {
        return select_fair(&always, employees, states, ShiftType::Evening, rng, 1)
            .first()
            .copied();
    }

    // Keep an already-running evening streak going.
    let streak: Vec<usize> = pool
        .iter()
        .copied()
        .filter(|&i| resting_after_evening(&states[i]))
        .collect();
    if !streak.is_empty() {
        return select_fair(&streak, employees, states, ShiftType::Evening, rng, 1)
            .first()
            .copied();
    }

    // A fresh evening should continue an existing run, not start a short one.
    let warmed: Vec<usize> = pool
        .iter()
        .copied()
        .filter(|&i| {
            employees[i].schedule_type == ScheduleType::Flexible
                && states[i].consecutive_working >= MIN_WORK_BETWEEN_OFFS - 1
        })
        .collect();
    if !warmed.is_empty() {
        return select_fair(&warmed, employees, states, ShiftType::Evening, rng, 1)
            .first()
            .copied();
    }

    select_for_mandatory(
        pool,
        employees,
        states,
        ShiftType::Evening,
        remaining_days,
        rng,
        1,
    )
    .first()
    .copied()
}

/// Hand out plain Moscow workdays by urgency until the norm pressure runs out
/// or handing out another would starve tomorrow's mandatory coverage.
fn fill_moscow_workdays(
    ctx: &DayContext<'_>,
    day: NaiveDate,
    next_day: Option<NaiveDate>,
    states: &[EmployeeState],
    assigned: &mut [Option<ShiftType>],
    remaining_days: u32,
    rng: &mut ChaCha8Rng,
) {
    let employees = ctx.employees;
    loop {
        let cands: Vec<usize> = (0..employees.len())
            .filter(|&i| {
                let e = &employees[i];
                assigned[i].is_none()
                    && e.city == City::Moscow
                    && e.on_duty
                    && !e.duty_only()
                    && can_work(e, &states[i], day, ctx.holidays)
                    && states[i].needs_more_work(remaining_days)
                    && states[i].consecutive_working < max_cw(e)
                    && !resting_after_evening(&states[i])
                    && !resting_after_night(&states[i])
                    && !(e.schedule_type == ScheduleType::Flexible
                        && states[i].consecutive_off == 1)
                    && !group_clash(employees, assigned, i, ShiftType::Workday)
            })
            .collect();
        if cands.is_empty() {
            return;
        }
        let ordered = select_by_urgency(&cands, states, remaining_days, rng);
        let idx = ordered[0];

        if let Some(next) = next_day {
            if is_weekend_or_holiday(next, ctx.holidays)
                && !tomorrow_coverage_ok(ctx, next, states, assigned, idx)
            {
                return;
            }
        }
        assigned[idx] = Some(ShiftType::Workday);
    }
}

/// Would all three mandatory shifts still be coverable tomorrow if `extra`
/// also worked today?
fn tomorrow_coverage_ok(
    ctx: &DayContext<'_>,
    next: NaiveDate,
    states: &[EmployeeState],
    assigned: &[Option<ShiftType>],
    extra: usize,
) -> bool {
    let employees = ctx.employees;

    let available = |i: usize| -> Option<ShiftType> {
        // Today's shift as it would stand with the extra assignment.
        let today = if i == extra {
            Some(ShiftType::Workday)
        } else {
            assigned[i]
        };
        let e = &employees[i];
        if !e.on_duty || e.is_blocked(next) {
            return None;
        }
        if e.days_off_weekly
            .contains(&(chrono::Datelike::weekday(&next).num_days_from_monday() as u8))
        {
            return None;
        }
        if e.schedule_type == ScheduleType::FiveTwo && is_weekend_or_holiday(next, ctx.holidays) {
            return None;
        }
        let cw_after_today = match today {
            Some(s) if s.is_working() => states[i].consecutive_working + 1,
            Some(_) => 0,
            None => 0,
        };
        if cw_after_today >= max_cw(e) {
            return None;
        }
        today.or(Some(ShiftType::DayOff))
    };

    let mut night = 0usize;
    let mut mornings: Vec<usize> = Vec::new();
    let mut evenings: Vec<usize> = Vec::new();
    for (i, e) in employees.iter().enumerate() {
        let Some(today) = available(i) else { continue };
        if today == ShiftType::Night {
            continue; // tomorrow is mandatory rest
        }
        match e.city {
            City::Khabarovsk => {
                if today != ShiftType::Evening {
                    night += 1;
                }
            }
            City::Moscow => {
                if e.can_work_morning() && today != ShiftType::Evening {
                    mornings.push(i);
                }
                if e.can_work_evening() {
                    evenings.push(i);
                }
            }
        }
    }

    night >= 1
        && mornings
            .iter()
            .any(|m| evenings.iter().any(|ev| ev != m))
}

/// Khabarovsk duty employees work nights or their local workday.
fn fill_khabarovsk(
    ctx: &DayContext<'_>,
    day: NaiveDate,
    states: &[EmployeeState],
    assigned: &mut [Option<ShiftType>],
    remaining_days: u32,
) {
    for (i, e) in ctx.employees.iter().enumerate() {
        if assigned[i].is_some() || e.city != City::Khabarovsk || !e.on_duty {
            continue;
        }
        let st = &states[i];
        let shift = if e.is_on_vacation(day) {
            ShiftType::Vacation
        } else if resting_after_night(st)
            || resting_after_evening(st)
            || !can_work(e, st, day, ctx.holidays)
        {
            ShiftType::DayOff
        } else if st.needs_more_work(remaining_days)
            && !(e.schedule_type == ScheduleType::Flexible && st.consecutive_off == 1)
            && !group_clash(ctx.employees, assigned, i, ShiftType::Workday)
        {
            ShiftType::Workday
        } else {
            ShiftType::DayOff
        };
        assigned[i] = Some(shift);
    }
}

/// Final repairs before commit: no over-long off runs, no short work runs.
fn apply_overrides(
    ctx: &DayContext<'_>,
    day: NaiveDate,
    is_holiday: bool,
    states: &[EmployeeState],
    assigned: &mut [Option<ShiftType>],
    remaining_days: u32,
) {
    for (i, e) in ctx.employees.iter().enumerate() {
        if assigned[i] != Some(ShiftType::DayOff) || e.duty_only() {
            continue;
        }
        // Pinned cells are immutable, overrides included.
        if ctx
            .pins
            .iter()
            .any(|p| p.date == day && p.employee_name == e.name)
        {
            continue;
        }
        let st = &states[i];
        let flexible = e.schedule_type == ScheduleType::Flexible;

        // A fourth consecutive off day is never acceptable while work exists.
        let over_rested = st.consecutive_off >= MAX_CONSECUTIVE_OFF
            && !is_holiday
            && (st.needs_more_work(remaining_days) || flexible);
        // A one- or two-day work run sandwiched between offs is worse than
        // stretching it, holidays included.
        let run_too_short = flexible
            && st.consecutive_working > 0
            && st.consecutive_working < MIN_WORK_BETWEEN_OFFS;

        if (over_rested || run_too_short)
            && can_work(e, st, day, ctx.holidays)
            && !resting_after_evening(st)
            && !resting_after_night(st)
            && !group_clash(ctx.employees, assigned, i, ShiftType::Workday)
        {
            assigned[i] = Some(ShiftType::Workday);
        }
    }
}
