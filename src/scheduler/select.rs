use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::model::{Employee, ShiftType};

use super::state::EmployeeState;

/// Pick `count` candidates carrying the fewest shifts of this type.
///
/// Ties prefer the employee whose `preferred_shift` matches, then fall to a
/// seeded-random key, so the result is deterministic for a given RNG state.
pub fn select_fair(
    candidates: &[usize],
    employees: &[Employee],
    states: &[EmployeeState],
    shift: ShiftType,
    rng: &mut ChaCha8Rng,
    count: usize,
) -> Vec<usize> {
    let mut keyed: Vec<(u32, bool, u64, usize)> = candidates
        .iter()
        .map(|&idx| {
            (
                states[idx].shift_count(shift),
                employees[idx].preferred_shift != Some(shift),
                rng.random::<u64>(),
                idx,
            )
        })
        .collect();
    keyed.sort();
    keyed.into_iter().take(count).map(|(_, _, _, idx)| idx).collect()
}

/// Fair pick for a mandatory shift that favours employees behind their norm.
pub fn select_for_mandatory(
    candidates: &[usize],
    employees: &[Employee],
    states: &[EmployeeState],
    shift: ShiftType,
    remaining_days: u32,
    rng: &mut ChaCha8Rng,
    count: usize,
) -> Vec<usize> {
    let needy: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&idx| states[idx].needs_more_work(remaining_days))
        .collect();
    if needy.len() >= count {
        select_fair(&needy, employees, states, shift, rng, count)
    } else {
        select_fair(candidates, employees, states, shift, rng, count)
    }
}

/// Order candidates by how urgently they need work to meet their norm.
///
/// Urgency is `deficit / remaining_days`; employees already at their norm sink
/// to the bottom in random order.
pub fn select_by_urgency(
    candidates: &[usize],
    states: &[EmployeeState],
    remaining_days: u32,
    rng: &mut ChaCha8Rng,
) -> Vec<usize> {
    let mut keyed: Vec<(f64, usize)> = candidates
        .iter()
        .map(|&idx| {
            let st = &states[idx];
            let deficit = f64::from(st.effective_target()) - f64::from(st.total_working);
            let key = if deficit <= 0.0 {
                -rng.random::<f64>()
            } else {
                deficit / f64::from(remaining_days.max(1)) + rng.random::<f64>() * 0.001
            };
            (key, idx)
        })
        .collect();
    keyed.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    keyed.into_iter().map(|(_, idx)| idx).collect()
}
