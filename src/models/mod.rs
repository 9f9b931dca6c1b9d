// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Attendee, CheckInStatus, EventConfig, InterestSignal, Match, PairingFormat, RepeatPolicy,
    Round, RoundPlan, Seating, TimerState, TimerStatus, TimerUpdate,
};
pub use requests::{
    AdvanceTimerRequest, OpenEventRequest, PauseTimerRequest, SubmitInterestRequest,
    UpdateDurationRequest,
};
pub use responses::{
    ErrorResponse, FinalizeResponse, HealthResponse, MatchesResponse, OpenEventResponse,
    SubmitInterestResponse,
};
