use crate::core::resolver;
use crate::core::timer::{EventTimer, TimerError};
use crate::core::{SchedulingError, SignalError};
use crate::models::{
    EventConfig, InterestSignal, Match, RoundPlan, TimerState, TimerUpdate,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};

/// Errors surfaced by the coordinator to the API layer
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("event already open: {0}")]
    EventAlreadyOpen(String),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error(transparent)]
    Signal(#[from] SignalError),
}

/// One open event: plan, timer, subscribers and collected signals
///
/// The timer mutex is the single-writer serialization point — every
/// mutating transition for this event goes through it in arrival order, and
/// a loser of a race sees the post-transition state and gets the state
/// conflict that state implies. Signals live behind their own short-lived
/// lock so submission never contends with timer transitions.
#[derive(Debug)]
pub struct LiveEvent {
    pub event_id: String,
    pub config: EventConfig,
    pub plan: Arc<RoundPlan>,
    timer: Mutex<EventTimer>,
    updates: broadcast::Sender<TimerUpdate>,
    signals: Mutex<HashMap<(u32, String), InterestSignal>>,
}

impl LiveEvent {
    fn new(event_id: &str, config: EventConfig, plan: RoundPlan, capacity: usize) -> Self {
        let (updates, _) = broadcast::channel(capacity);
        Self {
            event_id: event_id.to_string(),
            config: config.clone(),
            timer: Mutex::new(EventTimer::new(
                event_id,
                config.round_duration_seconds,
                plan.len(),
            )),
            plan: Arc::new(plan),
            updates,
            signals: Mutex::new(HashMap::new()),
        }
    }
}

/// Owns every open event and serializes timer transitions per event
///
/// Events are fully independent: each has its own timer lock and its own
/// broadcast channel, so transitions for different events never contend.
/// Broadcasting is fire-and-forget — a slow subscriber lags and skips,
/// a gone subscriber just drops, and the writer never waits on either.
pub struct EventCoordinator {
    events: RwLock<HashMap<String, Arc<LiveEvent>>>,
    broadcast_capacity: usize,
}

impl EventCoordinator {
    pub fn new(broadcast_capacity: usize) -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
            broadcast_capacity,
        }
    }

    /// Register a freshly planned event; rejects an id that is already open
    pub async fn open_event(
        &self,
        event_id: &str,
        config: EventConfig,
        plan: RoundPlan,
    ) -> Result<Arc<LiveEvent>, EngineError> {
        let mut events = self.events.write().await;
        if events.contains_key(event_id) {
            return Err(EngineError::EventAlreadyOpen(event_id.to_string()));
        }

        let event = Arc::new(LiveEvent::new(
            event_id,
            config,
            plan,
            self.broadcast_capacity,
        ));
        events.insert(event_id.to_string(), event.clone());

        tracing::info!(
            "Opened event {} ({} rounds, {} attendees)",
            event_id,
            event.plan.len(),
            event.plan.scheduled_attendees.len()
        );

        Ok(event)
    }

    pub async fn get(&self, event_id: &str) -> Result<Arc<LiveEvent>, EngineError> {
        self.events
            .read()
            .await
            .get(event_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownEvent(event_id.to_string()))
    }

    /// Start round 1
    pub async fn start(&self, event_id: &str) -> Result<TimerState, EngineError> {
        let event = self.get(event_id).await?;
        let mut timer = event.timer.lock().await;
        let now = Utc::now();
        let update = timer.start(now)?;
        Self::publish(&event, update);
        Ok(timer.snapshot(now))
    }

    /// Pause with the client-reported remaining time
    pub async fn pause(
        &self,
        event_id: &str,
        reported_remaining: u32,
    ) -> Result<TimerState, EngineError> {
        let event = self.get(event_id).await?;
        let mut timer = event.timer.lock().await;
        let now = Utc::now();
        let update = timer.pause(now, reported_remaining)?;
        Self::publish(&event, update);
        Ok(timer.snapshot(now))
    }

    /// Resume a paused round
    pub async fn resume(&self, event_id: &str) -> Result<TimerState, EngineError> {
        let event = self.get(event_id).await?;
        let mut timer = event.timer.lock().await;
        let now = Utc::now();
        let update = timer.resume(now)?;
        Self::publish(&event, update);
        Ok(timer.snapshot(now))
    }

    /// Advance to the next round, finishing when plan or cap is exhausted
    ///
    /// `max_rounds` defaults to the event's configured round budget.
    pub async fn advance(
        &self,
        event_id: &str,
        max_rounds: Option<u32>,
    ) -> Result<TimerState, EngineError> {
        let event = self.get(event_id).await?;
        let cap = max_rounds.unwrap_or(event.config.round_budget);
        let mut timer = event.timer.lock().await;
        let now = Utc::now();
        let update = timer.advance(now, cap)?;
        Self::publish(&event, update);
        Ok(timer.snapshot(now))
    }

    /// Change the round duration for subsequent rounds
    pub async fn update_duration(
        &self,
        event_id: &str,
        new_duration_seconds: u32,
    ) -> Result<TimerState, EngineError> {
        let event = self.get(event_id).await?;
        let mut timer = event.timer.lock().await;
        let now = Utc::now();
        let update = timer.update_duration(now, new_duration_seconds)?;
        Self::publish(&event, update);
        Ok(timer.snapshot(now))
    }

    /// Current snapshot without any transition
    pub async fn snapshot(&self, event_id: &str) -> Result<TimerState, EngineError> {
        let event = self.get(event_id).await?;
        let timer = event.timer.lock().await;
        Ok(timer.snapshot(Utc::now()))
    }

    /// Subscribe to timer updates: snapshot-on-join, then pushes
    ///
    /// Taking the receiver and the snapshot under the timer lock guarantees
    /// the snapshot is consistent with the first pushed update — transitions
    /// publish while holding the same lock.
    pub async fn subscribe(
        &self,
        event_id: &str,
    ) -> Result<(TimerState, broadcast::Receiver<TimerUpdate>), EngineError> {
        let event = self.get(event_id).await?;
        let timer = event.timer.lock().await;
        let rx = event.updates.subscribe();
        Ok((timer.snapshot(Utc::now()), rx))
    }

    /// Record an interest signal after validating it against the plan
    ///
    /// At most one signal per (round, attendee) — resubmission overwrites.
    pub async fn submit_interest(
        &self,
        event_id: &str,
        round_number: u32,
        from_attendee: &str,
        toward_attendee: &str,
        interested: bool,
    ) -> Result<InterestSignal, EngineError> {
        let event = self.get(event_id).await?;

        let signal = InterestSignal {
            event_id: event_id.to_string(),
            round_number,
            from_attendee: from_attendee.to_string(),
            toward_attendee: toward_attendee.to_string(),
            interested,
            submitted_at: Utc::now(),
        };
        resolver::validate_signal(&event.plan, &signal)?;

        let mut signals = event.signals.lock().await;
        signals.insert((round_number, from_attendee.to_string()), signal.clone());

        tracing::debug!(
            "Recorded signal {} -> {} (round {}, interested: {})",
            from_attendee,
            toward_attendee,
            round_number,
            interested
        );

        Ok(signal)
    }

    /// Reduce the collected signals to the mutual-match list
    pub async fn resolve_matches(&self, event_id: &str) -> Result<Vec<Match>, EngineError> {
        let event = self.get(event_id).await?;
        let signals: Vec<InterestSignal> = {
            let guard = event.signals.lock().await;
            guard.values().cloned().collect()
        };
        Ok(resolver::resolve_matches(&event.plan, &signals))
    }

    /// Fan a transition out to whoever is listening
    ///
    /// send only fails when there are no receivers, which is normal before
    /// the first client connects.
    fn publish(event: &LiveEvent, update: TimerUpdate) {
        let delivered = event.updates.send(update.clone()).unwrap_or(0);
        tracing::debug!(
            "Broadcast {} for event {} to {} subscribers",
            update.kind(),
            event.event_id,
            delivered
        );
    }
}
