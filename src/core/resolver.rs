use crate::models::{InterestSignal, Match, RoundPlan};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from interest-signal ingest
///
/// An invalid signal is rejected and discarded — never coerced onto the
/// "correct" partner.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error(
        "attendee {from} was not paired with {toward} in round {round_number} \
         of event {event_id} (assigned partner: {assigned:?})"
    )]
    InvalidPairing {
        event_id: String,
        round_number: u32,
        from: String,
        toward: String,
        assigned: Option<String>,
    },

    #[error("round {round_number} is outside the plan for event {event_id} ({plan_rounds} rounds)")]
    RoundOutOfRange {
        event_id: String,
        round_number: u32,
        plan_rounds: u32,
    },
}

/// Check a signal against the plan: only the declared partner for that
/// round may be named
pub fn validate_signal(plan: &RoundPlan, signal: &InterestSignal) -> Result<(), SignalError> {
    if signal.round_number == 0 || signal.round_number > plan.len() {
        return Err(SignalError::RoundOutOfRange {
            event_id: plan.event_id.clone(),
            round_number: signal.round_number,
            plan_rounds: plan.len(),
        });
    }

    let assigned = plan.partner_of(signal.round_number, &signal.from_attendee);
    if assigned != Some(signal.toward_attendee.as_str()) {
        return Err(SignalError::InvalidPairing {
            event_id: plan.event_id.clone(),
            round_number: signal.round_number,
            from: signal.from_attendee.clone(),
            toward: signal.toward_attendee.clone(),
            assigned: assigned.map(str::to_string),
        });
    }

    Ok(())
}

/// Reduce the signal set to the mutual-match list
///
/// Pure function of the plan and the signals: recomputing over the same
/// inputs always yields the same output, in (round, attendee) order. A pair
/// matches iff both directional signals exist and both are interested.
/// One-sided or negative signals are a normal terminal state, not an error.
///
/// Signals that do not fit the plan are skipped here; ingest validation is
/// where they get rejected loudly.
pub fn resolve_matches(plan: &RoundPlan, signals: &[InterestSignal]) -> Vec<Match> {
    // (round, low id, high id) -> (low->high interested, high->low interested)
    let mut by_pair: HashMap<(u32, &str, &str), (Option<bool>, Option<bool>)> = HashMap::new();

    for signal in signals {
        if validate_signal(plan, signal).is_err() {
            continue;
        }

        let from = signal.from_attendee.as_str();
        let toward = signal.toward_attendee.as_str();
        let (low, high, from_is_low) = if from < toward {
            (from, toward, true)
        } else {
            (toward, from, false)
        };

        let entry = by_pair
            .entry((signal.round_number, low, high))
            .or_insert((None, None));
        if from_is_low {
            entry.0 = Some(signal.interested);
        } else {
            entry.1 = Some(signal.interested);
        }
    }

    let mut matches: Vec<Match> = by_pair
        .into_iter()
        .filter(|(_, (a_to_b, b_to_a))| *a_to_b == Some(true) && *b_to_a == Some(true))
        .map(|((round_number, low, high), _)| Match {
            event_id: plan.event_id.clone(),
            attendee_a: low.to_string(),
            attendee_b: high.to_string(),
            round_number,
        })
        .collect();

    matches.sort_by(|a, b| {
        (a.round_number, &a.attendee_a, &a.attendee_b)
            .cmp(&(b.round_number, &b.attendee_a, &b.attendee_b))
    });
    matches
}
