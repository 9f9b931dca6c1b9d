//! Rondo - Round engine for in-person speed-dating events
//!
//! This library provides the core of the Rondo event platform: the pairing
//! scheduler that seats attendees across rounds, the timer coordinator that
//! keeps every client's countdown in sync, and the match resolver that turns
//! interest signals into mutual matches.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    compute_round_plan, resolve_matches, EventTimer, SchedulerOptions, SchedulingError,
    SignalError, TimerError,
};
pub use crate::models::{
    Attendee, CheckInStatus, EventConfig, InterestSignal, Match, PairingFormat, RepeatPolicy,
    RoundPlan, TimerState, TimerStatus, TimerUpdate,
};
pub use crate::services::{EngineError, EventCoordinator, RegistryClient};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attendee, CheckInStatus};

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let roster: Vec<Attendee> = ["A", "B"]
            .iter()
            .map(|id| Attendee {
                attendee_id: id.to_string(),
                name: None,
                category: None,
                status: CheckInStatus::CheckedIn,
            })
            .collect();
        let plan = compute_round_plan("evt", &roster, 1, 5, SchedulerOptions::default()).unwrap();
        assert_eq!(plan.len(), 1);
    }
}
