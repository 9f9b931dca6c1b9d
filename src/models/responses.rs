use crate::models::domain::{Match, TimerState};
use serde::{Deserialize, Serialize};

/// Response for opening an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenEventResponse {
    #[serde(rename = "eventId")]
    pub event_id: String,
    pub rounds: u32,
    #[serde(rename = "scheduledAttendees")]
    pub scheduled_attendees: usize,
    /// Non-zero when the round budget truncated pair coverage
    #[serde(rename = "pairsNeverMet")]
    pub pairs_never_met: u32,
    pub timer: TimerState,
}

/// Response for submitting an interest signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitInterestResponse {
    pub success: bool,
    #[serde(rename = "submittedAt")]
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// Response for resolving matches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesResponse {
    #[serde(rename = "eventId")]
    pub event_id: String,
    pub matches: Vec<Match>,
    pub total: usize,
}

/// Response for finalizing an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeResponse {
    #[serde(rename = "eventId")]
    pub event_id: String,
    #[serde(rename = "matchesRecorded")]
    pub matches_recorded: usize,
    pub success: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
