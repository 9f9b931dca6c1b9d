use crate::models::{PairingFormat, RepeatPolicy};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to open an event: fetch roster and config, compute the plan
///
/// Every field is an override; whatever is omitted comes from the registry's
/// event configuration (falling back to service defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct OpenEventRequest {
    #[validate(range(min = 1))]
    #[serde(alias = "table_count", rename = "tableCount")]
    pub table_count: Option<u16>,
    #[serde(alias = "round_budget", rename = "roundBudget")]
    pub round_budget: Option<u32>,
    #[validate(range(min = 1))]
    #[serde(alias = "round_duration_seconds", rename = "roundDurationSeconds")]
    pub round_duration_seconds: Option<u32>,
    #[serde(default)]
    pub format: Option<PairingFormat>,
    #[serde(alias = "repeat_policy", rename = "repeatPolicy", default)]
    pub repeat_policy: Option<RepeatPolicy>,
}

/// Request to pause a running round
///
/// The client reports the remaining time it displayed; that value becomes
/// authoritative for the resumed countdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PauseTimerRequest {
    #[serde(alias = "remaining_seconds", rename = "remainingSeconds")]
    pub remaining_seconds: u32,
}

/// Request to advance to the next round
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvanceTimerRequest {
    /// Caps the number of rounds below the plan length; defaults to the
    /// event's round budget
    #[serde(alias = "max_rounds", rename = "maxRounds", default)]
    pub max_rounds: Option<u32>,
}

/// Request to change the round duration for subsequent rounds
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateDurationRequest {
    #[validate(range(min = 1))]
    #[serde(alias = "round_duration_seconds", rename = "roundDurationSeconds")]
    pub round_duration_seconds: u32,
}

/// Request to record a directional interest signal
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitInterestRequest {
    #[validate(range(min = 1))]
    #[serde(alias = "round_number", rename = "roundNumber")]
    pub round_number: u32,
    #[validate(length(min = 1))]
    #[serde(alias = "from_attendee", rename = "fromAttendee")]
    pub from_attendee: String,
    #[validate(length(min = 1))]
    #[serde(alias = "toward_attendee", rename = "towardAttendee")]
    pub toward_attendee: String,
    pub interested: bool,
}
