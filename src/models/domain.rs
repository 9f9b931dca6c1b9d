use serde::{Deserialize, Serialize};

/// Check-in lifecycle of an attendee, owned by the participant registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInStatus {
    Registered,
    CheckedIn,
    Cancelled,
}

/// Attendee record as supplied by the participant registry
///
/// The engine treats this as read-only input: identity, category and
/// check-in status are decided elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    #[serde(rename = "attendeeId")]
    pub attendee_id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Category tag, only consulted for heterogeneous-pair events
    #[serde(default)]
    pub category: Option<String>,
    pub status: CheckInStatus,
}

impl Attendee {
    pub fn checked_in(&self) -> bool {
        self.status == CheckInStatus::CheckedIn
    }
}

/// How attendees are paired within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingFormat {
    /// Everyone can meet everyone (circle-method round robin)
    #[default]
    Open,
    /// Pairs always cross the two category groups (bipartite rotation)
    Heterogeneous,
}

/// What to do when the round budget exceeds full pair coverage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// Stop scheduling once every pair has met
    #[default]
    NeverRepeat,
    /// Keep scheduling from a shifted fixed point; repeats only occur
    /// after full coverage
    Rotate,
}

/// Event configuration, supplied by the registry with local fallbacks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    #[serde(rename = "tableCount")]
    pub table_count: u16,
    #[serde(rename = "roundDurationSeconds")]
    pub round_duration_seconds: u32,
    #[serde(rename = "roundBudget")]
    pub round_budget: u32,
    #[serde(default)]
    pub format: PairingFormat,
    #[serde(rename = "repeatPolicy", default)]
    pub repeat_policy: RepeatPolicy,
}

/// One pair seated at a table for one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seating {
    pub table: u16,
    #[serde(rename = "attendeeA")]
    pub attendee_a: String,
    #[serde(rename = "attendeeB")]
    pub attendee_b: String,
}

impl Seating {
    /// True if the given attendee occupies either seat
    pub fn involves(&self, attendee_id: &str) -> bool {
        self.attendee_a == attendee_id || self.attendee_b == attendee_id
    }
}

/// One round of the plan: seatings plus whoever sits out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    #[serde(rename = "roundNumber")]
    pub round_number: u32,
    pub seatings: Vec<Seating>,
    #[serde(rename = "sittingOut", default)]
    pub sitting_out: Vec<String>,
}

/// Complete precomputed seating plan for one event
///
/// Computed once against the checked-in snapshot at event start and
/// immutable afterwards. This is the single source of truth for "who was
/// paired with whom in round R" — interest signals are validated against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundPlan {
    #[serde(rename = "eventId")]
    pub event_id: String,
    pub rounds: Vec<Round>,
    /// Attendee ids that were actually scheduled
    #[serde(rename = "scheduledAttendees")]
    pub scheduled_attendees: Vec<String>,
    /// Unordered pairs that never meet under this plan (under-coverage
    /// diagnostic; non-zero when the round budget truncates the rotation)
    #[serde(rename = "pairsNeverMet")]
    pub pairs_never_met: u32,
}

impl RoundPlan {
    /// Number of rounds in the plan
    pub fn len(&self) -> u32 {
        self.rounds.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Round by 1-based round number
    pub fn round(&self, round_number: u32) -> Option<&Round> {
        if round_number == 0 {
            return None;
        }
        self.rounds.get(round_number as usize - 1)
    }

    /// The partner assigned to `attendee_id` in the given round, if any
    ///
    /// `None` means the attendee sits out that round, is not scheduled at
    /// all, or the round number is out of range.
    pub fn partner_of(&self, round_number: u32, attendee_id: &str) -> Option<&str> {
        let round = self.round(round_number)?;
        round.seatings.iter().find_map(|s| {
            if s.attendee_a == attendee_id {
                Some(s.attendee_b.as_str())
            } else if s.attendee_b == attendee_id {
                Some(s.attendee_a.as_str())
            } else {
                None
            }
        })
    }
}

/// Timer lifecycle per event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    Finished,
}

impl TimerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Finished => "finished",
        }
    }
}

impl std::fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authoritative countdown state for one event
///
/// Mutated only by the timer coordinator; everyone else receives read-only
/// snapshots. `remaining_seconds` is derived from `last_transition_at` when
/// the snapshot is taken — the coordinator never ticks in the background.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerState {
    #[serde(rename = "eventId")]
    pub event_id: String,
    #[serde(rename = "roundNumber")]
    pub round_number: u32,
    pub status: TimerStatus,
    #[serde(rename = "roundDurationSeconds")]
    pub round_duration_seconds: u32,
    #[serde(rename = "remainingSeconds")]
    pub remaining_seconds: u32,
    #[serde(rename = "lastTransitionAt")]
    pub last_transition_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Tagged transition event pushed to timer subscribers
///
/// Each variant carries only the fields relevant to that transition; late
/// joiners receive a full `TimerState` snapshot before the stream of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TimerUpdate {
    #[serde(rename = "round.started")]
    RoundStarted {
        #[serde(rename = "eventId")]
        event_id: String,
        #[serde(rename = "roundNumber")]
        round_number: u32,
        #[serde(rename = "roundDurationSeconds")]
        round_duration_seconds: u32,
    },
    #[serde(rename = "round.paused")]
    RoundPaused {
        #[serde(rename = "eventId")]
        event_id: String,
        #[serde(rename = "roundNumber")]
        round_number: u32,
        #[serde(rename = "remainingSeconds")]
        remaining_seconds: u32,
    },
    #[serde(rename = "round.resumed")]
    RoundResumed {
        #[serde(rename = "eventId")]
        event_id: String,
        #[serde(rename = "roundNumber")]
        round_number: u32,
        #[serde(rename = "remainingSeconds")]
        remaining_seconds: u32,
    },
    #[serde(rename = "round.advanced")]
    RoundAdvanced {
        #[serde(rename = "eventId")]
        event_id: String,
        #[serde(rename = "roundNumber")]
        round_number: u32,
        #[serde(rename = "roundDurationSeconds")]
        round_duration_seconds: u32,
    },
    #[serde(rename = "duration.changed")]
    DurationChanged {
        #[serde(rename = "eventId")]
        event_id: String,
        #[serde(rename = "roundDurationSeconds")]
        round_duration_seconds: u32,
    },
    #[serde(rename = "event.finished")]
    EventFinished {
        #[serde(rename = "eventId")]
        event_id: String,
        #[serde(rename = "finalRound")]
        final_round: u32,
    },
}

impl TimerUpdate {
    /// Stable event-type string, used as the SSE `event:` field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RoundStarted { .. } => "round.started",
            Self::RoundPaused { .. } => "round.paused",
            Self::RoundResumed { .. } => "round.resumed",
            Self::RoundAdvanced { .. } => "round.advanced",
            Self::DurationChanged { .. } => "duration.changed",
            Self::EventFinished { .. } => "event.finished",
        }
    }
}

/// Directional interest signal for one round
///
/// At most one per `(event, round, from_attendee)` — a resubmission
/// overwrites the prior value, it does not append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestSignal {
    #[serde(rename = "eventId")]
    pub event_id: String,
    #[serde(rename = "roundNumber")]
    pub round_number: u32,
    #[serde(rename = "fromAttendee")]
    pub from_attendee: String,
    #[serde(rename = "towardAttendee")]
    pub toward_attendee: String,
    pub interested: bool,
    #[serde(rename = "submittedAt")]
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// Mutual match, derived from the signal set on demand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    #[serde(rename = "eventId")]
    pub event_id: String,
    #[serde(rename = "attendeeA")]
    pub attendee_a: String,
    #[serde(rename = "attendeeB")]
    pub attendee_b: String,
    #[serde(rename = "roundNumber")]
    pub round_number: u32,
}
