// Integration tests for Rondo: the full open -> run -> signal -> resolve
// flow against the coordinator, the way the HTTP layer drives it

use rondo::core::scheduler::{compute_round_plan, SchedulerOptions};
use rondo::models::{
    Attendee, CheckInStatus, EventConfig, PairingFormat, RepeatPolicy, TimerStatus, TimerUpdate,
};
use rondo::services::{EngineError, EventCoordinator};

fn test_roster(ids: &[&str]) -> Vec<Attendee> {
    ids.iter()
        .map(|id| Attendee {
            attendee_id: id.to_string(),
            name: Some(format!("Attendee {}", id)),
            category: None,
            status: CheckInStatus::CheckedIn,
        })
        .collect()
}

fn test_config(rounds: u32) -> EventConfig {
    EventConfig {
        table_count: 4,
        round_duration_seconds: 240,
        round_budget: rounds,
        format: PairingFormat::Open,
        repeat_policy: RepeatPolicy::NeverRepeat,
    }
}

async fn open_event(coordinator: &EventCoordinator, event_id: &str, ids: &[&str]) {
    let roster = test_roster(ids);
    let config = test_config(20);
    let plan = compute_round_plan(
        event_id,
        &roster,
        config.table_count as usize,
        config.round_budget,
        SchedulerOptions {
            format: config.format,
            repeat_policy: config.repeat_policy,
        },
    )
    .unwrap();
    coordinator.open_event(event_id, config, plan).await.unwrap();
}

#[tokio::test]
async fn test_full_event_lifecycle() {
    let coordinator = EventCoordinator::new(64);
    open_event(&coordinator, "evt-1", &["A", "B", "C", "D"]).await;

    // A subscriber joins before the event starts
    let (snapshot, mut rx) = coordinator.subscribe("evt-1").await.unwrap();
    assert_eq!(snapshot.status, TimerStatus::Idle);

    // Operator drives all three rounds
    coordinator.start("evt-1").await.unwrap();
    for _ in 0..2 {
        coordinator.advance("evt-1", None).await.unwrap();
    }
    let state = coordinator.advance("evt-1", None).await.unwrap();
    assert_eq!(state.status, TimerStatus::Finished);

    // The subscriber saw every transition in order
    let mut kinds = Vec::new();
    while let Ok(update) = rx.try_recv() {
        kinds.push(update.kind());
    }
    assert_eq!(
        kinds,
        vec![
            "round.started",
            "round.advanced",
            "round.advanced",
            "event.finished"
        ]
    );

    // Attendees who liked each other in round 3 ({A,B} and {C,D}) match
    coordinator
        .submit_interest("evt-1", 3, "A", "B", true)
        .await
        .unwrap();
    coordinator
        .submit_interest("evt-1", 3, "B", "A", true)
        .await
        .unwrap();
    coordinator
        .submit_interest("evt-1", 3, "C", "D", true)
        .await
        .unwrap();
    coordinator
        .submit_interest("evt-1", 3, "D", "C", false)
        .await
        .unwrap();

    let matches = coordinator.resolve_matches("evt-1").await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].attendee_a, "A");
    assert_eq!(matches[0].attendee_b, "B");
    assert_eq!(matches[0].round_number, 3);

    // Resolution is stable across repeated calls
    let again = coordinator.resolve_matches("evt-1").await.unwrap();
    assert_eq!(matches, again);
}

#[tokio::test]
async fn test_pause_resume_mid_round() {
    let coordinator = EventCoordinator::new(64);
    open_event(&coordinator, "evt-1", &["A", "B", "C", "D"]).await;

    coordinator.start("evt-1").await.unwrap();
    let paused = coordinator.pause("evt-1", 151).await.unwrap();
    assert_eq!(paused.status, TimerStatus::Paused);
    assert_eq!(paused.remaining_seconds, 151);

    let resumed = coordinator.resume("evt-1").await.unwrap();
    assert_eq!(resumed.status, TimerStatus::Running);
    assert_eq!(resumed.round_number, 1);
    assert_eq!(resumed.remaining_seconds, 151);
}

#[tokio::test]
async fn test_conflicting_operator_actions_surface_cleanly() {
    let coordinator = EventCoordinator::new(64);
    open_event(&coordinator, "evt-1", &["A", "B", "C", "D"]).await;

    // Resume before start, pause before start
    assert!(matches!(
        coordinator.resume("evt-1").await,
        Err(EngineError::Timer(_))
    ));
    assert!(matches!(
        coordinator.pause("evt-1", 100).await,
        Err(EngineError::Timer(_))
    ));

    // The rejected transitions never reached subscribers
    let (_, mut rx) = coordinator.subscribe("evt-1").await.unwrap();
    coordinator.start("evt-1").await.unwrap();
    let first = rx.recv().await.unwrap();
    assert!(matches!(first, TimerUpdate::RoundStarted { .. }));
}

#[tokio::test]
async fn test_signals_validated_against_heterogeneous_plan() {
    let coordinator = EventCoordinator::new(64);
    let roster: Vec<Attendee> = vec![
        Attendee {
            attendee_id: "a1".to_string(),
            name: None,
            category: Some("left".to_string()),
            status: CheckInStatus::CheckedIn,
        },
        Attendee {
            attendee_id: "a2".to_string(),
            name: None,
            category: Some("left".to_string()),
            status: CheckInStatus::CheckedIn,
        },
        Attendee {
            attendee_id: "b1".to_string(),
            name: None,
            category: Some("right".to_string()),
            status: CheckInStatus::CheckedIn,
        },
        Attendee {
            attendee_id: "b2".to_string(),
            name: None,
            category: Some("right".to_string()),
            status: CheckInStatus::CheckedIn,
        },
    ];
    let config = EventConfig {
        format: PairingFormat::Heterogeneous,
        ..test_config(10)
    };
    let plan = compute_round_plan(
        "evt-h",
        &roster,
        4,
        10,
        SchedulerOptions {
            format: config.format,
            repeat_policy: config.repeat_policy,
        },
    )
    .unwrap();
    coordinator.open_event("evt-h", config, plan).await.unwrap();

    // Same-category signals can never be valid in this format
    assert!(coordinator
        .submit_interest("evt-h", 1, "a1", "a2", true)
        .await
        .is_err());

    // Cross-category signals for the actual partner are fine
    let event = coordinator.get("evt-h").await.unwrap();
    let partner = event.plan.partner_of(1, "a1").unwrap().to_string();
    assert!(coordinator
        .submit_interest("evt-h", 1, "a1", &partner, true)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_truncated_budget_is_detectable() {
    let roster = test_roster(&["A", "B", "C", "D", "E", "F", "G", "H"]);
    let plan = compute_round_plan("evt", &roster, 4, 3, SchedulerOptions::default()).unwrap();

    // 7 rounds would be needed; 3 leaves 28 - 12 pairs unmet
    assert_eq!(plan.len(), 3);
    assert_eq!(plan.pairs_never_met, 16);
}
