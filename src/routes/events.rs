use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

use crate::core::{SignalError, TimerError};
use crate::models::{
    AdvanceTimerRequest, ErrorResponse, EventConfig, FinalizeResponse, HealthResponse,
    MatchesResponse, OpenEventRequest, OpenEventResponse, PauseTimerRequest,
    SubmitInterestRequest, SubmitInterestResponse, TimerUpdate, UpdateDurationRequest,
};
use crate::core::scheduler::{compute_round_plan, SchedulerOptions};
use crate::services::{EngineError, EventCoordinator, RegistryClient, RegistryError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RegistryClient>,
    pub coordinator: Arc<EventCoordinator>,
    /// Fallback event configuration when the registry has none
    pub defaults: EventConfig,
}

/// Configure all event-engine routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/events/{event_id}/open", web::post().to(open_event))
        .route("/events/{event_id}/plan", web::get().to(get_plan))
        .route("/events/{event_id}/timer", web::get().to(get_timer))
        .route("/events/{event_id}/timer/stream", web::get().to(stream_timer))
        .route("/events/{event_id}/timer/start", web::post().to(start_timer))
        .route("/events/{event_id}/timer/pause", web::post().to(pause_timer))
        .route("/events/{event_id}/timer/resume", web::post().to(resume_timer))
        .route(
            "/events/{event_id}/timer/advance",
            web::post().to(advance_timer),
        )
        .route(
            "/events/{event_id}/timer/duration",
            web::post().to(update_duration),
        )
        .route("/events/{event_id}/interest", web::post().to(submit_interest))
        .route("/events/{event_id}/matches", web::get().to(get_matches))
        .route("/events/{event_id}/finalize", web::post().to(finalize_event));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Map an engine error onto the JSON error shape the clients expect
fn engine_error(err: EngineError) -> HttpResponse {
    let (status, error) = match &err {
        EngineError::UnknownEvent(_) => (404u16, "unknown_event"),
        EngineError::EventAlreadyOpen(_) => (409, "event_already_open"),
        EngineError::Scheduling(_) => (400, "scheduling_error"),
        EngineError::Timer(TimerError::StateConflict { .. }) => (409, "state_conflict"),
        EngineError::Signal(SignalError::InvalidPairing { .. }) => (422, "invalid_pairing"),
        EngineError::Signal(SignalError::RoundOutOfRange { .. }) => (422, "invalid_pairing"),
    };
    let body = ErrorResponse {
        error: error.to_string(),
        message: err.to_string(),
        status_code: status,
    };
    match status {
        404 => HttpResponse::NotFound().json(body),
        409 => HttpResponse::Conflict().json(body),
        422 => HttpResponse::UnprocessableEntity().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn registry_error(context: &str, err: RegistryError) -> HttpResponse {
    tracing::error!("{}: {}", context, err);
    let body = ErrorResponse {
        error: "registry_error".to_string(),
        message: format!("{context}: {err}"),
        status_code: 502,
    };
    match err {
        RegistryError::NotFound(_) => HttpResponse::NotFound().json(ErrorResponse {
            error: "not_found".to_string(),
            status_code: 404,
            ..body
        }),
        _ => HttpResponse::BadGateway().json(body),
    }
}

fn validation_error(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Open an event: pull roster and config from the registry, compute the
/// seating plan and register the timer
///
/// POST /api/v1/events/{event_id}/open
///
/// Request body (all fields optional overrides):
/// ```json
/// {
///   "tableCount": 8,
///   "roundBudget": 12,
///   "roundDurationSeconds": 300,
///   "format": "open|heterogeneous",
///   "repeatPolicy": "never_repeat|rotate"
/// }
/// ```
async fn open_event(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<OpenEventRequest>,
) -> impl Responder {
    let event_id = path.into_inner();

    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for open_event request: {:?}", errors);
        return validation_error(errors);
    }

    tracing::info!("Opening event: {}", event_id);

    // Registry config is the baseline; a missing one falls back to service
    // defaults so small events can run on overrides alone
    let base = match state.registry.get_event_config(&event_id).await {
        Ok(config) => config,
        Err(RegistryError::NotFound(_)) => {
            tracing::warn!(
                "No registry config for event {}, using service defaults",
                event_id
            );
            state.defaults.clone()
        }
        Err(e) => return registry_error("Failed to fetch event config", e),
    };

    let config = EventConfig {
        table_count: req.table_count.unwrap_or(base.table_count),
        round_duration_seconds: req
            .round_duration_seconds
            .unwrap_or(base.round_duration_seconds),
        round_budget: req.round_budget.unwrap_or(base.round_budget),
        format: req.format.unwrap_or(base.format),
        repeat_policy: req.repeat_policy.unwrap_or(base.repeat_policy),
    };

    let roster = match state.registry.get_roster(&event_id).await {
        Ok(roster) => roster,
        Err(e) => return registry_error("Failed to fetch roster", e),
    };

    tracing::debug!(
        "Fetched {} roster entries for event {}",
        roster.len(),
        event_id
    );

    let options = SchedulerOptions {
        format: config.format,
        repeat_policy: config.repeat_policy,
    };
    let plan = match compute_round_plan(
        &event_id,
        &roster,
        config.table_count as usize,
        config.round_budget,
        options,
    ) {
        Ok(plan) => plan,
        Err(e) => return engine_error(EngineError::Scheduling(e)),
    };

    if plan.pairs_never_met > 0 {
        tracing::warn!(
            "Event {} plan leaves {} pairs unmet (budget {} rounds)",
            event_id,
            plan.pairs_never_met,
            config.round_budget
        );
    }

    // Push the plan to the registry for downstream display; the engine's
    // own copy stays authoritative either way
    if let Err(e) = state.registry.store_round_plan(&plan).await {
        tracing::warn!("Failed to store round plan for {}: {}", event_id, e);
    }

    let event = match state
        .coordinator
        .open_event(&event_id, config, plan)
        .await
    {
        Ok(event) => event,
        Err(e) => return engine_error(e),
    };

    let timer = match state.coordinator.snapshot(&event_id).await {
        Ok(snapshot) => snapshot,
        Err(e) => return engine_error(e),
    };

    HttpResponse::Ok().json(OpenEventResponse {
        event_id: event.event_id.clone(),
        rounds: event.plan.len(),
        scheduled_attendees: event.plan.scheduled_attendees.len(),
        pairs_never_met: event.plan.pairs_never_met,
        timer,
    })
}

/// Get the computed seating plan
///
/// GET /api/v1/events/{event_id}/plan
async fn get_plan(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.coordinator.get(&path.into_inner()).await {
        Ok(event) => HttpResponse::Ok().json(&*event.plan),
        Err(e) => engine_error(e),
    }
}

/// Current timer snapshot
///
/// GET /api/v1/events/{event_id}/timer
async fn get_timer(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.coordinator.snapshot(&path.into_inner()).await {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(e) => engine_error(e),
    }
}

/// Start round 1
///
/// POST /api/v1/events/{event_id}/timer/start
async fn start_timer(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.coordinator.start(&path.into_inner()).await {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(e) => engine_error(e),
    }
}

/// Pause the running round with the client-reported remaining time
///
/// POST /api/v1/events/{event_id}/timer/pause
async fn pause_timer(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<PauseTimerRequest>,
) -> impl Responder {
    match state
        .coordinator
        .pause(&path.into_inner(), req.remaining_seconds)
        .await
    {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(e) => engine_error(e),
    }
}

/// Resume a paused round
///
/// POST /api/v1/events/{event_id}/timer/resume
async fn resume_timer(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.coordinator.resume(&path.into_inner()).await {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(e) => engine_error(e),
    }
}

/// Advance to the next round (or finish the event)
///
/// POST /api/v1/events/{event_id}/timer/advance
async fn advance_timer(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<AdvanceTimerRequest>,
) -> impl Responder {
    match state
        .coordinator
        .advance(&path.into_inner(), req.max_rounds)
        .await
    {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(e) => engine_error(e),
    }
}

/// Change the round duration for subsequent rounds
///
/// POST /api/v1/events/{event_id}/timer/duration
async fn update_duration(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<UpdateDurationRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    match state
        .coordinator
        .update_duration(&path.into_inner(), req.round_duration_seconds)
        .await
    {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(e) => engine_error(e),
    }
}

/// SSE stream of timer updates: a snapshot frame on join, then one frame
/// per transition
///
/// GET /api/v1/events/{event_id}/timer/stream
///
/// A comment heartbeat goes out every 15 seconds to keep the connection
/// alive through proxies. A subscriber that lags far enough to drop frames
/// gets a `_warning` event so it knows to re-fetch the snapshot.
async fn stream_timer(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let event_id = path.into_inner();
    let (snapshot, mut rx) = match state.coordinator.subscribe(&event_id).await {
        Ok(subscription) => subscription,
        Err(e) => return engine_error(e),
    };

    tracing::info!("Timer stream client connected for event {}", event_id);

    let stream = async_stream::stream! {
        if let Some(frame) = sse_frame("snapshot", &snapshot) {
            yield Ok::<_, std::convert::Infallible>(frame);
        }

        let mut heartbeat = tokio::time::interval(Duration::from_secs(15));
        heartbeat.tick().await;

        loop {
            tokio::select! {
                update = rx.recv() => match update {
                    Ok(update) => {
                        let finished = matches!(update, TimerUpdate::EventFinished { .. });
                        if let Some(frame) = sse_frame(update.kind(), &update) {
                            yield Ok(frame);
                        }
                        if finished {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Timer stream client lagged, skipped {n} updates");
                        let warning = web::Bytes::from(format!(
                            "event: _warning\ndata: {{\"message\":\"lagged, skipped {n} updates\"}}\n\n"
                        ));
                        yield Ok(warning);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        break;
                    }
                },
                _ = heartbeat.tick() => {
                    yield Ok(web::Bytes::from_static(b": heartbeat\n\n"));
                }
            }
        }
    };

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}

/// Encode one SSE frame; a value that will not serialize is skipped
fn sse_frame<T: serde::Serialize>(event: &str, data: &T) -> Option<web::Bytes> {
    match serde_json::to_string(data) {
        Ok(json) => Some(web::Bytes::from(format!("event: {event}\ndata: {json}\n\n"))),
        Err(e) => {
            tracing::warn!("Failed to serialize {} frame: {}", event, e);
            None
        }
    }
}

/// Record a directional interest signal
///
/// POST /api/v1/events/{event_id}/interest
///
/// Request body:
/// ```json
/// {
///   "roundNumber": 3,
///   "fromAttendee": "string",
///   "towardAttendee": "string",
///   "interested": true
/// }
/// ```
async fn submit_interest(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<SubmitInterestRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    match state
        .coordinator
        .submit_interest(
            &path.into_inner(),
            req.round_number,
            &req.from_attendee,
            &req.toward_attendee,
            req.interested,
        )
        .await
    {
        Ok(signal) => HttpResponse::Ok().json(SubmitInterestResponse {
            success: true,
            submitted_at: signal.submitted_at,
        }),
        Err(e) => engine_error(e),
    }
}

/// Resolve the mutual-match list from the collected signals
///
/// GET /api/v1/events/{event_id}/matches
async fn get_matches(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let event_id = path.into_inner();
    match state.coordinator.resolve_matches(&event_id).await {
        Ok(matches) => {
            let total = matches.len();
            HttpResponse::Ok().json(MatchesResponse {
                event_id,
                matches,
                total,
            })
        }
        Err(e) => engine_error(e),
    }
}

/// Resolve matches and push them to the registry sink
///
/// POST /api/v1/events/{event_id}/finalize
///
/// Safe to repeat: resolution is a pure function of the signal set, so a
/// retry stores the same list again.
async fn finalize_event(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let event_id = path.into_inner();

    let matches = match state.coordinator.resolve_matches(&event_id).await {
        Ok(matches) => matches,
        Err(e) => return engine_error(e),
    };

    if let Err(e) = state.registry.store_matches(&event_id, &matches).await {
        return registry_error("Failed to store matches", e);
    }

    tracing::info!(
        "Finalized event {} with {} matches",
        event_id,
        matches.len()
    );

    HttpResponse::Ok().json(FinalizeResponse {
        event_id,
        matches_recorded: matches.len(),
        success: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_shape() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            timestamp: chrono::Utc::now(),
        };
        assert_eq!(response.status, "healthy");
    }

    #[test]
    fn sse_frame_format() {
        let frame = sse_frame("snapshot", &serde_json::json!({"a": 1})).unwrap();
        let text = String::from_utf8(frame.to_vec()).unwrap();
        assert!(text.starts_with("event: snapshot\ndata: "));
        assert!(text.ends_with("\n\n"));
    }
}
