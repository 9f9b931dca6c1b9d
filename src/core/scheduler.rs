use crate::models::{
    Attendee, PairingFormat, RepeatPolicy, Round, RoundPlan, Seating,
};
use std::collections::HashSet;
use thiserror::Error;

/// Errors from round-plan computation
///
/// All of these are fatal to the computation and are never retried
/// internally.
#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("not enough tables: {required} pairs per round but only {available} tables")]
    NotEnoughTables { required: usize, available: usize },

    #[error("heterogeneous pairing needs exactly 2 category groups, found {found}")]
    InvalidCategorySplit { found: usize },
}

/// Scheduler knobs beyond roster and table count
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerOptions {
    pub format: PairingFormat,
    pub repeat_policy: RepeatPolicy,
}

/// Compute the full seating plan for one event
///
/// Only checked-in attendees are scheduled; everyone else in the roster is
/// ignored. The plan is deterministic: the same roster order, table count
/// and options always reproduce the same seatings.
///
/// # Coverage
/// With an unconstrained round budget, every unordered pair (every cross
/// pair for heterogeneous events) meets exactly once. A smaller budget
/// truncates the rotation and `pairs_never_met` reports how many pairs the
/// truncation cost — callers must check it rather than assume full coverage.
pub fn compute_round_plan(
    event_id: &str,
    roster: &[Attendee],
    table_count: usize,
    round_budget: u32,
    options: SchedulerOptions,
) -> Result<RoundPlan, SchedulingError> {
    let active: Vec<&Attendee> = roster.iter().filter(|a| a.checked_in()).collect();

    if active.len() <= 1 {
        return Ok(RoundPlan {
            event_id: event_id.to_string(),
            rounds: Vec::new(),
            scheduled_attendees: active.iter().map(|a| a.attendee_id.clone()).collect(),
            pairs_never_met: 0,
        });
    }

    match options.format {
        PairingFormat::Open => {
            plan_round_robin(event_id, &active, table_count, round_budget, options.repeat_policy)
        }
        PairingFormat::Heterogeneous => {
            plan_bipartite(event_id, &active, table_count, round_budget, options.repeat_policy)
        }
    }
}

/// Circle-method round robin over the whole roster
///
/// Slot 0 stays fixed, the rest rotate one position clockwise per round;
/// round k pairs position i with position n'-1-i. An odd roster gets a
/// virtual bye slot, and whoever draws the bye sits out that round.
fn plan_round_robin(
    event_id: &str,
    active: &[&Attendee],
    table_count: usize,
    round_budget: u32,
    repeat_policy: RepeatPolicy,
) -> Result<RoundPlan, SchedulingError> {
    let n = active.len();
    // Slots indexed into `active`; None is the bye
    let mut slots: Vec<Option<usize>> = (0..n).map(Some).collect();
    if n % 2 == 1 {
        slots.push(None);
    }
    let n_prime = slots.len();
    let full_rotation = (n_prime - 1) as u32;

    check_tables(n / 2, table_count)?;

    let scheduled_rounds = match repeat_policy {
        RepeatPolicy::NeverRepeat => round_budget.min(full_rotation),
        RepeatPolicy::Rotate => round_budget,
    };

    let mut rounds = Vec::with_capacity(scheduled_rounds as usize);
    let mut met: HashSet<(usize, usize)> = HashSet::new();

    for k in 0..scheduled_rounds {
        // Past one full rotation every pair has met; shift the fixed point
        // so repeats spread across the roster instead of replaying round 1
        let cycle = (k / full_rotation) as usize;
        let within = k % full_rotation;

        let base: Vec<Option<usize>> = if cycle == 0 {
            slots.clone()
        } else {
            let mut shifted = slots.clone();
            shifted.rotate_left(cycle % n_prime);
            shifted
        };

        let arrangement = rotate_clockwise(&base, within as usize);
        rounds.push(build_round(active, &arrangement, k + 1, &mut met));
    }

    let total_pairs = (n * (n - 1) / 2) as u32;
    Ok(RoundPlan {
        event_id: event_id.to_string(),
        rounds,
        scheduled_attendees: active.iter().map(|a| a.attendee_id.clone()).collect(),
        pairs_never_met: total_pairs - met.len() as u32,
    })
}

/// Bipartite rotation for heterogeneous events
///
/// The roster splits into its two category groups; the smaller group is
/// padded with byes to a common size m, and round k pairs A[i] with
/// B[(i + k) mod m], so every cross pair meets exactly once in m rounds.
fn plan_bipartite(
    event_id: &str,
    active: &[&Attendee],
    table_count: usize,
    round_budget: u32,
    repeat_policy: RepeatPolicy,
) -> Result<RoundPlan, SchedulingError> {
    let mut categories: Vec<&str> = active
        .iter()
        .map(|a| a.category.as_deref().unwrap_or(""))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    categories.sort_unstable();

    if categories.len() != 2 {
        return Err(SchedulingError::InvalidCategorySplit {
            found: categories.len(),
        });
    }

    let group_a: Vec<usize> = active
        .iter()
        .enumerate()
        .filter(|(_, a)| a.category.as_deref().unwrap_or("") == categories[0])
        .map(|(i, _)| i)
        .collect();
    let group_b: Vec<usize> = active
        .iter()
        .enumerate()
        .filter(|(_, a)| a.category.as_deref().unwrap_or("") == categories[1])
        .map(|(i, _)| i)
        .collect();

    let m = group_a.len().max(group_b.len());
    let pad = |group: &[usize]| -> Vec<Option<usize>> {
        let mut slots: Vec<Option<usize>> = group.iter().copied().map(Some).collect();
        slots.resize(m, None);
        slots
    };
    let slots_a = pad(&group_a);
    let slots_b = pad(&group_b);

    check_tables(group_a.len().min(group_b.len()), table_count)?;

    let full_rotation = m as u32;
    let scheduled_rounds = match repeat_policy {
        RepeatPolicy::NeverRepeat => round_budget.min(full_rotation),
        RepeatPolicy::Rotate => round_budget,
    };

    let mut rounds = Vec::with_capacity(scheduled_rounds as usize);
    let mut met: HashSet<(usize, usize)> = HashSet::new();

    for k in 0..scheduled_rounds {
        let mut arrangement: Vec<(Option<usize>, Option<usize>)> = Vec::with_capacity(m);
        for i in 0..m {
            arrangement.push((slots_a[i], slots_b[(i + k as usize) % m]));
        }

        let mut seatings = Vec::new();
        let mut sitting_out = Vec::new();
        let mut table = 1u16;
        for (a, b) in arrangement {
            match (a, b) {
                (Some(a), Some(b)) => {
                    met.insert(pair_key(a, b));
                    seatings.push(Seating {
                        table,
                        attendee_a: active[a].attendee_id.clone(),
                        attendee_b: active[b].attendee_id.clone(),
                    });
                    table += 1;
                }
                (Some(a), None) => sitting_out.push(active[a].attendee_id.clone()),
                (None, Some(b)) => sitting_out.push(active[b].attendee_id.clone()),
                (None, None) => {}
            }
        }
        rounds.push(Round {
            round_number: k + 1,
            seatings,
            sitting_out,
        });
    }

    let cross_pairs = (group_a.len() * group_b.len()) as u32;
    Ok(RoundPlan {
        event_id: event_id.to_string(),
        rounds,
        scheduled_attendees: active.iter().map(|a| a.attendee_id.clone()).collect(),
        pairs_never_met: cross_pairs - met.len() as u32,
    })
}

/// The bye occupies no table, so the requirement is real pairs per round
fn check_tables(pairs_per_round: usize, table_count: usize) -> Result<(), SchedulingError> {
    if table_count < pairs_per_round {
        return Err(SchedulingError::NotEnoughTables {
            required: pairs_per_round,
            available: table_count,
        });
    }
    Ok(())
}

/// Keep slot 0 fixed and rotate the remaining slots `k` positions clockwise
fn rotate_clockwise(slots: &[Option<usize>], k: usize) -> Vec<Option<usize>> {
    let m = slots.len() - 1;
    let mut arrangement = Vec::with_capacity(slots.len());
    arrangement.push(slots[0]);
    for i in 0..m {
        arrangement.push(slots[1 + (i + m - (k % m)) % m]);
    }
    arrangement
}

/// Pair position i with position n'-1-i and assign tables in pair order
fn build_round(
    active: &[&Attendee],
    arrangement: &[Option<usize>],
    round_number: u32,
    met: &mut HashSet<(usize, usize)>,
) -> Round {
    let n_prime = arrangement.len();
    let mut seatings = Vec::with_capacity(n_prime / 2);
    let mut sitting_out = Vec::new();
    let mut table = 1u16;

    for i in 0..n_prime / 2 {
        match (arrangement[i], arrangement[n_prime - 1 - i]) {
            (Some(a), Some(b)) => {
                met.insert(pair_key(a, b));
                seatings.push(Seating {
                    table,
                    attendee_a: active[a].attendee_id.clone(),
                    attendee_b: active[b].attendee_id.clone(),
                });
                table += 1;
            }
            (Some(a), None) => sitting_out.push(active[a].attendee_id.clone()),
            (None, Some(b)) => sitting_out.push(active[b].attendee_id.clone()),
            (None, None) => {}
        }
    }

    Round {
        round_number,
        seatings,
        sitting_out,
    }
}

fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}
