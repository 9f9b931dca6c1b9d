use crate::models::{TimerState, TimerStatus, TimerUpdate};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Transition attempted against the timer state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    Pause,
    Resume,
    Advance,
    UpdateDuration,
}

impl TimerCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Advance => "advance",
            Self::UpdateDuration => "update_duration",
        }
    }
}

impl std::fmt::Display for TimerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from timer transitions
///
/// A state conflict carries the event, the attempted command and the status
/// it was attempted from, so the caller can re-fetch and decide whether to
/// retry. Nothing is retried internally and a rejected transition changes
/// no state.
#[derive(Debug, Error)]
pub enum TimerError {
    #[error("cannot {command} event {event_id} while {status}")]
    StateConflict {
        event_id: String,
        command: TimerCommand,
        status: TimerStatus,
    },
}

/// State machine for one event's countdown
///
/// `idle → running → {paused ⇄ running} → ... → finished`
///
/// This is the pure core: every method takes `now` explicitly and returns
/// the `TimerUpdate` to broadcast. Serialization of concurrent callers is
/// the coordinator's job, not this type's.
///
/// There is no ticking loop — the remaining time of a running round is
/// derived from `last_transition_at` whenever a snapshot is taken.
#[derive(Debug, Clone)]
pub struct EventTimer {
    state: TimerState,
    plan_rounds: u32,
}

impl EventTimer {
    pub fn new(event_id: &str, round_duration_seconds: u32, plan_rounds: u32) -> Self {
        Self {
            state: TimerState {
                event_id: event_id.to_string(),
                round_number: 0,
                status: TimerStatus::Idle,
                round_duration_seconds,
                remaining_seconds: round_duration_seconds,
                last_transition_at: None,
            },
            plan_rounds,
        }
    }

    pub fn status(&self) -> TimerStatus {
        self.state.status
    }

    /// Read-only snapshot with the countdown evaluated at `now`
    pub fn snapshot(&self, now: DateTime<Utc>) -> TimerState {
        let mut snap = self.state.clone();
        snap.remaining_seconds = self.remaining_at(now);
        snap
    }

    /// Begin round 1; valid only from idle
    ///
    /// An empty plan finishes immediately — there is nothing to run.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<TimerUpdate, TimerError> {
        if self.state.status != TimerStatus::Idle {
            return Err(self.conflict(TimerCommand::Start));
        }

        if self.plan_rounds == 0 {
            self.state.status = TimerStatus::Finished;
            self.state.last_transition_at = Some(now);
            return Ok(TimerUpdate::EventFinished {
                event_id: self.state.event_id.clone(),
                final_round: 0,
            });
        }

        self.state.round_number = 1;
        self.state.remaining_seconds = self.state.round_duration_seconds;
        self.state.status = TimerStatus::Running;
        self.state.last_transition_at = Some(now);

        Ok(TimerUpdate::RoundStarted {
            event_id: self.state.event_id.clone(),
            round_number: 1,
            round_duration_seconds: self.state.round_duration_seconds,
        })
    }

    /// Freeze the countdown; valid only from running
    ///
    /// The caller-reported remaining time becomes authoritative — the most
    /// recently active client's clock wins over ours at this boundary.
    pub fn pause(
        &mut self,
        now: DateTime<Utc>,
        reported_remaining: u32,
    ) -> Result<TimerUpdate, TimerError> {
        if self.state.status != TimerStatus::Running {
            return Err(self.conflict(TimerCommand::Pause));
        }

        self.state.remaining_seconds = reported_remaining.min(self.state.round_duration_seconds);
        self.state.status = TimerStatus::Paused;
        self.state.last_transition_at = Some(now);

        Ok(TimerUpdate::RoundPaused {
            event_id: self.state.event_id.clone(),
            round_number: self.state.round_number,
            remaining_seconds: self.state.remaining_seconds,
        })
    }

    /// Continue from the stored remaining time; valid only from paused
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<TimerUpdate, TimerError> {
        if self.state.status != TimerStatus::Paused {
            return Err(self.conflict(TimerCommand::Resume));
        }

        self.state.status = TimerStatus::Running;
        self.state.last_transition_at = Some(now);

        Ok(TimerUpdate::RoundResumed {
            event_id: self.state.event_id.clone(),
            round_number: self.state.round_number,
            remaining_seconds: self.state.remaining_seconds,
        })
    }

    /// Move to the next round, or finish when the plan or `max_rounds`
    /// is exhausted; valid from running or paused
    pub fn advance(
        &mut self,
        now: DateTime<Utc>,
        max_rounds: u32,
    ) -> Result<TimerUpdate, TimerError> {
        if !matches!(
            self.state.status,
            TimerStatus::Running | TimerStatus::Paused
        ) {
            return Err(self.conflict(TimerCommand::Advance));
        }

        let next = self.state.round_number + 1;
        if next > self.plan_rounds || next > max_rounds {
            let final_round = self.state.round_number;
            self.state.status = TimerStatus::Finished;
            self.state.remaining_seconds = 0;
            self.state.last_transition_at = Some(now);
            return Ok(TimerUpdate::EventFinished {
                event_id: self.state.event_id.clone(),
                final_round,
            });
        }

        self.state.round_number = next;
        self.state.remaining_seconds = self.state.round_duration_seconds;
        self.state.status = TimerStatus::Running;
        self.state.last_transition_at = Some(now);

        Ok(TimerUpdate::RoundAdvanced {
            event_id: self.state.event_id.clone(),
            round_number: next,
            round_duration_seconds: self.state.round_duration_seconds,
        })
    }

    /// Change the duration for subsequent rounds; valid before finished
    ///
    /// The current round's remaining time is untouched unless the round has
    /// not started ticking, which only holds while idle — start, resume and
    /// advance all begin ticking immediately.
    pub fn update_duration(
        &mut self,
        now: DateTime<Utc>,
        new_duration_seconds: u32,
    ) -> Result<TimerUpdate, TimerError> {
        if self.state.status == TimerStatus::Finished {
            return Err(self.conflict(TimerCommand::UpdateDuration));
        }

        self.state.round_duration_seconds = new_duration_seconds;
        if self.state.status == TimerStatus::Idle {
            self.state.remaining_seconds = new_duration_seconds;
        }
        self.state.last_transition_at = Some(now);

        Ok(TimerUpdate::DurationChanged {
            event_id: self.state.event_id.clone(),
            round_duration_seconds: new_duration_seconds,
        })
    }

    /// Remaining seconds evaluated at `now`; only a running timer decays
    fn remaining_at(&self, now: DateTime<Utc>) -> u32 {
        match (self.state.status, self.state.last_transition_at) {
            (TimerStatus::Running, Some(since)) => {
                let elapsed = (now - since).num_seconds().max(0) as u64;
                (self.state.remaining_seconds as u64).saturating_sub(elapsed) as u32
            }
            _ => self.state.remaining_seconds,
        }
    }

    fn conflict(&self, command: TimerCommand) -> TimerError {
        TimerError::StateConflict {
            event_id: self.state.event_id.clone(),
            command,
            status: self.state.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn running_timer(rounds: u32) -> EventTimer {
        let mut timer = EventTimer::new("evt-1", 240, rounds);
        timer.start(at(0)).unwrap();
        timer
    }

    #[test]
    fn start_only_from_idle() {
        let mut timer = running_timer(3);
        let err = timer.start(at(1)).unwrap_err();
        let TimerError::StateConflict {
            command, status, ..
        } = err;
        assert_eq!(command, TimerCommand::Start);
        assert_eq!(status, TimerStatus::Running);
    }

    #[test]
    fn start_sets_round_one_running() {
        let mut timer = EventTimer::new("evt-1", 240, 3);
        let update = timer.start(at(0)).unwrap();
        assert!(matches!(
            update,
            TimerUpdate::RoundStarted {
                round_number: 1,
                round_duration_seconds: 240,
                ..
            }
        ));

        let snap = timer.snapshot(at(0));
        assert_eq!(snap.status, TimerStatus::Running);
        assert_eq!(snap.remaining_seconds, 240);
    }

    #[test]
    fn running_countdown_is_derived_not_ticked() {
        let timer = running_timer(3);
        assert_eq!(timer.snapshot(at(30)).remaining_seconds, 210);
        assert_eq!(timer.snapshot(at(239)).remaining_seconds, 1);
        // Floor at zero once the round has run out
        assert_eq!(timer.snapshot(at(1000)).remaining_seconds, 0);
    }

    #[test]
    fn pause_accepts_client_reported_remaining() {
        let mut timer = running_timer(3);
        let update = timer.pause(at(100), 147).unwrap();
        assert!(matches!(
            update,
            TimerUpdate::RoundPaused {
                remaining_seconds: 147,
                ..
            }
        ));
        // Paused time does not decay
        assert_eq!(timer.snapshot(at(500)).remaining_seconds, 147);
    }

    #[test]
    fn pause_clamps_reported_value_to_duration() {
        let mut timer = running_timer(3);
        timer.pause(at(10), 9_999).unwrap();
        assert_eq!(timer.snapshot(at(10)).remaining_seconds, 240);
    }

    #[test]
    fn pause_resume_preserves_round_and_remaining() {
        let mut timer = running_timer(3);
        timer.pause(at(60), 180).unwrap();
        timer.resume(at(90)).unwrap();

        let snap = timer.snapshot(at(90));
        assert_eq!(snap.round_number, 1);
        assert_eq!(snap.remaining_seconds, 180);
        assert_eq!(snap.status, TimerStatus::Running);

        // Countdown restarts from the stored value
        assert_eq!(timer.snapshot(at(120)).remaining_seconds, 150);
    }

    #[test]
    fn double_pause_is_a_conflict() {
        let mut timer = running_timer(3);
        timer.pause(at(10), 200).unwrap();
        let err = timer.pause(at(11), 190).unwrap_err();
        let TimerError::StateConflict {
            command, status, ..
        } = err;
        assert_eq!(command, TimerCommand::Pause);
        assert_eq!(status, TimerStatus::Paused);
        // Rejected transition left state untouched
        assert_eq!(timer.snapshot(at(11)).remaining_seconds, 200);
    }

    #[test]
    fn resume_requires_paused() {
        let mut timer = running_timer(3);
        assert!(timer.resume(at(5)).is_err());
    }

    #[test]
    fn advance_from_paused_resets_remaining_to_duration() {
        let mut timer = running_timer(3);
        timer.pause(at(60), 17).unwrap();
        let update = timer.advance(at(70), 10).unwrap();
        assert!(matches!(
            update,
            TimerUpdate::RoundAdvanced {
                round_number: 2,
                round_duration_seconds: 240,
                ..
            }
        ));
        let snap = timer.snapshot(at(70));
        assert_eq!(snap.remaining_seconds, 240);
        assert_eq!(snap.status, TimerStatus::Running);
    }

    #[test]
    fn advancing_past_the_plan_finishes() {
        let mut timer = running_timer(3);
        timer.advance(at(240), 10).unwrap();
        timer.advance(at(480), 10).unwrap();
        let update = timer.advance(at(720), 10).unwrap();
        assert!(matches!(
            update,
            TimerUpdate::EventFinished { final_round: 3, .. }
        ));
        assert_eq!(timer.status(), TimerStatus::Finished);

        // Finished accepts nothing further
        assert!(timer.advance(at(721), 10).is_err());
        assert!(timer.pause(at(721), 10).is_err());
        assert!(timer.resume(at(721)).is_err());
        assert!(timer.update_duration(at(721), 60).is_err());
    }

    #[test]
    fn max_rounds_caps_below_plan_length() {
        let mut timer = running_timer(5);
        timer.advance(at(240), 2).unwrap();
        let update = timer.advance(at(480), 2).unwrap();
        assert!(matches!(
            update,
            TimerUpdate::EventFinished { final_round: 2, .. }
        ));
    }

    #[test]
    fn duration_change_spares_the_current_round() {
        let mut timer = running_timer(3);
        timer.update_duration(at(30), 120).unwrap();

        // Current round still counts down from the old duration
        assert_eq!(timer.snapshot(at(30)).remaining_seconds, 240);
        assert_eq!(timer.snapshot(at(30)).round_duration_seconds, 120);

        // Next round picks up the new duration
        timer.advance(at(60), 10).unwrap();
        assert_eq!(timer.snapshot(at(60)).remaining_seconds, 120);
    }

    #[test]
    fn duration_change_while_idle_applies_immediately() {
        let mut timer = EventTimer::new("evt-1", 240, 3);
        timer.update_duration(at(0), 90).unwrap();
        assert_eq!(timer.snapshot(at(0)).remaining_seconds, 90);

        timer.start(at(5)).unwrap();
        assert_eq!(timer.snapshot(at(5)).remaining_seconds, 90);
    }

    #[test]
    fn empty_plan_finishes_on_start() {
        let mut timer = EventTimer::new("evt-1", 240, 0);
        let update = timer.start(at(0)).unwrap();
        assert!(matches!(
            update,
            TimerUpdate::EventFinished { final_round: 0, .. }
        ));
        assert_eq!(timer.status(), TimerStatus::Finished);
    }
}
