use chrono::{DateTime, Duration, TimeZone, Utc};
use seatline_core::{
    Countdown, ManualClock, MemoryReservationStore, Reconciliation, ReservationLifecycleTracker, ReservationStore,
    Tick, TrackerSettings, TrackerState,
};
use seatline_shared::{ReservationRecord, SeatState, SeatStatus};
use std::sync::Arc;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
}

fn new_tracker(user_id: &str, clock: &ManualClock, store: &Arc<MemoryReservationStore>) -> ReservationLifecycleTracker {
    ReservationLifecycleTracker::new(user_id, store.clone(), Arc::new(clock.clone()), TrackerSettings::default())
}

fn seat_list(seat_number: u32, status: SeatState) -> Vec<SeatStatus> {
    vec![
        SeatStatus { seat_number: 1, status: SeatState::Free },
        SeatStatus { seat_number, status },
    ]
}

async fn saved_record(store: &MemoryReservationStore, user_id: &str) -> Option<ReservationRecord> {
    store
        .load(&format!("reservation_{}", user_id))
        .await
        .unwrap()
        .map(|raw| serde_json::from_str(&raw).unwrap())
}

async fn persist(store: &MemoryReservationStore, record: &ReservationRecord) {
    store
        .save(&format!("reservation_{}", record.user_id), &serde_json::to_string(record).unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_countdown_reaches_zero_exactly_at_hold_end() {
    let clock = ManualClock::new(t0());
    let store = Arc::new(MemoryReservationStore::new());
    let mut tracker = new_tracker("U1", &clock, &store);
    tracker.begin("E1", 14).await.unwrap();

    let mut previous = u64::MAX;
    for elapsed in 0..600 {
        clock.set(t0() + Duration::seconds(elapsed));
        match tracker.tick().await {
            Tick::Remaining(left) => {
                assert_eq!(left.as_secs(), (600 - elapsed) as u64);
                assert!(left.as_secs() <= previous);
                previous = left.as_secs();
            }
            other => panic!("expired early at {}s: {:?}", elapsed, other),
        }
    }

    clock.set(t0() + Duration::seconds(600));
    assert!(matches!(tracker.tick().await, Tick::Expired { .. }));
}

#[tokio::test]
async fn test_resume_keeps_original_timestamp() {
    let clock = ManualClock::new(t0() + Duration::minutes(5));
    let store = Arc::new(MemoryReservationStore::new());
    persist(&store, &ReservationRecord::new("E1", 14, "U1", t0())).await;

    let mut tracker = new_tracker("U1", &clock, &store);
    let candidate = tracker.resume().await.unwrap().expect("live record");
    assert_eq!(candidate.event_id, "E1");
    // Not trusted until the server says so
    assert_eq!(tracker.state(), &TrackerState::Idle);

    let outcome = tracker.reconcile("E1", &seat_list(14, SeatState::Reserving)).await.unwrap();
    match outcome {
        Reconciliation::Tracking { record, remaining } => {
            assert_eq!(record.timestamp, t0());
            assert_eq!(remaining, Countdown::from_secs(300));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(tracker.is_pending());
    assert_eq!(tracker.remaining().unwrap().to_string(), "5:00");
}

#[tokio::test]
async fn test_resume_discards_expired_record() {
    let clock = ManualClock::new(t0() + Duration::minutes(11));
    let store = Arc::new(MemoryReservationStore::new());
    persist(&store, &ReservationRecord::new("E1", 14, "U1", t0())).await;

    let mut tracker = new_tracker("U1", &clock, &store);
    assert!(tracker.resume().await.unwrap().is_none());
    assert!(saved_record(&store, "U1").await.is_none());

    // Even a server still showing the seat on hold cannot revive it
    let outcome = tracker.reconcile("E1", &seat_list(14, SeatState::Reserving)).await.unwrap();
    assert_eq!(outcome, Reconciliation::Untracked);
    assert_eq!(tracker.state(), &TrackerState::Idle);
}

#[tokio::test]
async fn test_server_truth_overrides_local_clock() {
    let clock = ManualClock::new(t0());
    let store = Arc::new(MemoryReservationStore::new());
    let mut tracker = new_tracker("U1", &clock, &store);
    tracker.begin("E1", 14).await.unwrap();

    clock.advance(Duration::minutes(3));
    let outcome = tracker.reconcile("E1", &seat_list(14, SeatState::Booked)).await.unwrap();

    assert!(matches!(
        outcome,
        Reconciliation::Discarded { status: Some(SeatState::Booked), .. }
    ));
    assert_eq!(tracker.state(), &TrackerState::Idle);
    assert!(saved_record(&store, "U1").await.is_none());
    assert_eq!(tracker.tick().await, Tick::Idle);
}

#[tokio::test]
async fn test_booking_expiry_end_to_end() {
    let clock = ManualClock::new(t0());
    let store = Arc::new(MemoryReservationStore::new());
    let mut tracker = new_tracker("U1", &clock, &store);

    tracker.begin("E1", 14).await.unwrap();
    assert_eq!(
        saved_record(&store, "U1").await,
        Some(ReservationRecord::new("E1", 14, "U1", t0()))
    );

    clock.set(t0() + Duration::seconds(599));
    match tracker.tick().await {
        Tick::Remaining(left) => assert_eq!(left.to_string(), "0:01"),
        other => panic!("unexpected {:?}", other),
    }

    clock.set(t0() + Duration::seconds(600));
    match tracker.tick().await {
        Tick::Expired { record } => assert_eq!(record.seat_number, 14),
        other => panic!("unexpected {:?}", other),
    }
    assert!(saved_record(&store, "U1").await.is_none());

    // Deferred refresh: server has released the seat
    let outcome = tracker.reconcile("E1", &seat_list(14, SeatState::Free)).await.unwrap();
    assert_eq!(outcome, Reconciliation::Untracked);
    assert_eq!(tracker.state(), &TrackerState::Idle);
}

#[tokio::test]
async fn test_confirm_before_expiry_removes_record() {
    let clock = ManualClock::new(t0());
    let store = Arc::new(MemoryReservationStore::new());
    let mut tracker = new_tracker("U1", &clock, &store);
    tracker.begin("E1", 14).await.unwrap();

    clock.set(t0() + Duration::seconds(120));
    let confirmed = tracker.confirm().await.unwrap();

    assert_eq!(confirmed.seat_number, 14);
    assert_eq!(tracker.state(), &TrackerState::Idle);
    assert!(saved_record(&store, "U1").await.is_none());
    assert_eq!(tracker.tick().await, Tick::Idle);
}

#[tokio::test]
async fn test_two_sessions_last_booking_wins() {
    let clock = ManualClock::new(t0());
    let store = Arc::new(MemoryReservationStore::new());
    let mut first = new_tracker("U1", &clock, &store);
    let mut second = new_tracker("U1", &clock, &store);

    first.begin("E1", 14).await.unwrap();
    clock.advance(Duration::seconds(5));
    second.begin("E1", 15).await.unwrap();

    let saved = saved_record(&store, "U1").await.unwrap();
    assert_eq!(saved.seat_number, 15);

    // The first session follows the persisted record on its next reload
    let seats = vec![
        SeatStatus { seat_number: 14, status: SeatState::Reserving },
        SeatStatus { seat_number: 15, status: SeatState::Reserving },
    ];
    match first.reconcile("E1", &seats).await.unwrap() {
        Reconciliation::Tracking { record, .. } => assert_eq!(record.seat_number, 15),
        other => panic!("unexpected {:?}", other),
    }

    // A fresh login only ever sees the latest booking
    let mut third = new_tracker("U1", &clock, &store);
    assert_eq!(third.resume().await.unwrap().unwrap().seat_number, 15);
}

#[tokio::test]
async fn test_stale_expiry_does_not_remove_newer_booking() {
    let clock = ManualClock::new(t0());
    let store = Arc::new(MemoryReservationStore::new());
    let mut first = new_tracker("U1", &clock, &store);
    let mut second = new_tracker("U1", &clock, &store);

    first.begin("E1", 14).await.unwrap();
    clock.advance(Duration::minutes(4));
    second.begin("E2", 3).await.unwrap();

    clock.advance(Duration::minutes(6));
    assert!(matches!(first.tick().await, Tick::Expired { .. }));

    let saved = saved_record(&store, "U1").await.unwrap();
    assert_eq!(saved.event_id, "E2");
}
