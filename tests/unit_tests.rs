// Unit tests for Rondo

use chrono::{TimeZone, Utc};
use rondo::core::{
    resolver::{resolve_matches, validate_signal},
    scheduler::{compute_round_plan, SchedulerOptions},
    timer::EventTimer,
};
use rondo::models::{Attendee, CheckInStatus, InterestSignal, RepeatPolicy, TimerStatus};

fn attendee(id: &str) -> Attendee {
    Attendee {
        attendee_id: id.to_string(),
        name: Some(format!("Attendee {}", id)),
        category: None,
        status: CheckInStatus::CheckedIn,
    }
}

fn roster(n: usize) -> Vec<Attendee> {
    (0..n).map(|i| attendee(&format!("p{i}"))).collect()
}

fn signal(round: u32, from: &str, toward: &str, interested: bool) -> InterestSignal {
    InterestSignal {
        event_id: "evt".to_string(),
        round_number: round,
        from_attendee: from.to_string(),
        toward_attendee: toward.to_string(),
        interested,
        submitted_at: Utc::now(),
    }
}

#[test]
fn test_even_roster_round_count() {
    let plan = compute_round_plan("evt", &roster(10), 5, 100, SchedulerOptions::default())
        .unwrap();
    assert_eq!(plan.len(), 9);
    assert_eq!(plan.pairs_never_met, 0);
}

#[test]
fn test_odd_roster_round_count() {
    let plan = compute_round_plan("evt", &roster(7), 3, 100, SchedulerOptions::default())
        .unwrap();
    assert_eq!(plan.len(), 7);
    for round in &plan.rounds {
        assert_eq!(round.seatings.len(), 3);
        assert_eq!(round.sitting_out.len(), 1);
    }
}

#[test]
fn test_every_round_seats_each_attendee_at_most_once() {
    let plan = compute_round_plan("evt", &roster(9), 4, 100, SchedulerOptions::default())
        .unwrap();
    for round in &plan.rounds {
        let mut seen = std::collections::HashSet::new();
        for seating in &round.seatings {
            assert!(seen.insert(seating.attendee_a.clone()));
            assert!(seen.insert(seating.attendee_b.clone()));
        }
        for benched in &round.sitting_out {
            assert!(seen.insert(benched.clone()));
        }
        assert_eq!(seen.len(), 9);
    }
}

#[test]
fn test_tables_fill_in_ascending_order() {
    let plan = compute_round_plan("evt", &roster(8), 6, 100, SchedulerOptions::default())
        .unwrap();
    for round in &plan.rounds {
        let tables: Vec<u16> = round.seatings.iter().map(|s| s.table).collect();
        assert_eq!(tables, vec![1, 2, 3, 4]);
    }
}

#[test]
fn test_rotate_policy_extends_past_coverage() {
    let options = SchedulerOptions {
        repeat_policy: RepeatPolicy::Rotate,
        ..SchedulerOptions::default()
    };
    let plan = compute_round_plan("evt", &roster(4), 2, 7, options).unwrap();
    assert_eq!(plan.len(), 7);
    assert_eq!(plan.pairs_never_met, 0);
}

#[test]
fn test_timer_full_lifecycle() {
    let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let mut timer = EventTimer::new("evt", 180, 3);

    timer.start(t0).unwrap();
    assert_eq!(timer.snapshot(t0).round_number, 1);

    let t1 = t0 + chrono::Duration::seconds(60);
    assert_eq!(timer.snapshot(t1).remaining_seconds, 120);

    timer.pause(t1, 118).unwrap();
    timer.resume(t1 + chrono::Duration::seconds(30)).unwrap();
    let snap = timer.snapshot(t1 + chrono::Duration::seconds(30));
    assert_eq!(snap.round_number, 1);
    assert_eq!(snap.remaining_seconds, 118);

    timer.advance(t1 + chrono::Duration::seconds(150), 10).unwrap();
    let snap = timer.snapshot(t1 + chrono::Duration::seconds(150));
    assert_eq!(snap.round_number, 2);
    assert_eq!(snap.remaining_seconds, 180);
    assert_eq!(snap.status, TimerStatus::Running);
}

#[test]
fn test_signal_validation_against_plan() {
    let plan = compute_round_plan(
        "evt",
        &[attendee("A"), attendee("B"), attendee("C"), attendee("D")],
        2,
        100,
        SchedulerOptions::default(),
    )
    .unwrap();

    // Round 1 pairs {A,D} and {B,C}
    assert!(validate_signal(&plan, &signal(1, "A", "D", true)).is_ok());
    assert!(validate_signal(&plan, &signal(1, "A", "B", true)).is_err());
    assert!(validate_signal(&plan, &signal(9, "A", "D", true)).is_err());
}

#[test]
fn test_match_requires_both_directions() {
    let plan = compute_round_plan(
        "evt",
        &[attendee("A"), attendee("B"), attendee("C"), attendee("D")],
        2,
        100,
        SchedulerOptions::default(),
    )
    .unwrap();

    let combos: [(bool, bool, usize); 4] =
        [(true, true, 1), (true, false, 0), (false, true, 0), (false, false, 0)];
    for (a_says, b_says, expected) in combos {
        let signals = vec![signal(3, "A", "B", a_says), signal(3, "B", "A", b_says)];
        assert_eq!(
            resolve_matches(&plan, &signals).len(),
            expected,
            "a={a_says} b={b_says}"
        );
    }
}
