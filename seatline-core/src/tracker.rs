use crate::clock::Clock;
use crate::countdown::Countdown;
use crate::repository::{reservation_key, ReservationStore};
use crate::{CoreError, CoreResult};
use chrono::Duration;
use seatline_shared::{ReservationRecord, SeatState, SeatStatus};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// How long a reservation stays live after its timestamp.
    pub hold: Duration,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            hold: Duration::minutes(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    /// Reservation corroborated by the server, countdown running.
    Pending(ReservationRecord),
    /// Countdown hit zero; waiting for the authoritative refresh before settling.
    Expired { event_id: String },
    /// Only observable between a confirmation and the immediate return to `Idle`.
    Confirmed,
}

impl TrackerState {
    pub fn name(&self) -> &'static str {
        match self {
            TrackerState::Idle => "IDLE",
            TrackerState::Pending(_) => "PENDING",
            TrackerState::Expired { .. } => "EXPIRED",
            TrackerState::Confirmed => "CONFIRMED",
        }
    }
}

/// What a details reload did to the tracked reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Nothing tracked for this user.
    Untracked,
    /// The record outlived the hold window and was removed.
    Lapsed(ReservationRecord),
    /// The record belongs to another event; kept for when that event is viewed.
    OtherEvent(ReservationRecord),
    /// Server reports the seat `reserving`; countdown continues from the original timestamp.
    Tracking {
        record: ReservationRecord,
        remaining: Countdown,
    },
    /// Server no longer reports the seat `reserving` (`None` when the seat is missing).
    Discarded {
        record: ReservationRecord,
        status: Option<SeatState>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    Idle,
    Remaining(Countdown),
    Expired { record: ReservationRecord },
}

/// Tracks at most one pending seat reservation for one user.
///
/// The persisted record is the source of truth between sessions; the server's
/// seat list is the source of truth within one. `Pending` is only entered when
/// the server corroborates the seat as `reserving`, or right after a successful
/// booking call.
pub struct ReservationLifecycleTracker {
    user_id: String,
    key: String,
    store: Arc<dyn ReservationStore>,
    clock: Arc<dyn Clock>,
    settings: TrackerSettings,
    state: TrackerState,
}

impl ReservationLifecycleTracker {
    pub fn new(
        user_id: impl Into<String>,
        store: Arc<dyn ReservationStore>,
        clock: Arc<dyn Clock>,
        settings: TrackerSettings,
    ) -> Self {
        let user_id = user_id.into();
        Self {
            key: reservation_key(&user_id),
            user_id,
            store,
            clock,
            settings,
            state: TrackerState::Idle,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn pending(&self) -> Option<&ReservationRecord> {
        match &self.state {
            TrackerState::Pending(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending().is_some()
    }

    /// Remaining time of the pending reservation, if any.
    pub fn remaining(&self) -> Option<Countdown> {
        self.pending().map(|record| self.countdown(record))
    }

    /// Reads back the persisted record at login.
    ///
    /// Returns the record when it is still live so the caller can load that
    /// event's details; the tracker itself stays `Idle` until `reconcile`
    /// sees the seat corroborated. Expired and unreadable records are removed.
    pub async fn resume(&mut self) -> CoreResult<Option<ReservationRecord>> {
        let Some(record) = self.read_persisted().await? else {
            debug!(user_id = %self.user_id, "No saved reservation");
            return Ok(None);
        };

        if !self.is_live(&record) {
            info!(
                user_id = %self.user_id,
                event_id = %record.event_id,
                seat_number = record.seat_number,
                "Saved reservation expired, discarding"
            );
            self.store.remove(&self.key).await?;
            return Ok(None);
        }

        info!(
            user_id = %self.user_id,
            event_id = %record.event_id,
            seat_number = record.seat_number,
            remaining = %self.countdown(&record),
            "Found saved reservation"
        );
        Ok(Some(record))
    }

    /// Idle → Pending after the server accepted a booking.
    ///
    /// Replaces whatever record the user had. If persisting fails the
    /// reservation is still tracked in memory and the store error is returned.
    pub async fn begin(&mut self, event_id: impl Into<String>, seat_number: u32) -> CoreResult<ReservationRecord> {
        let record = ReservationRecord::new(event_id, seat_number, self.user_id.clone(), self.clock.now());

        if let TrackerState::Pending(previous) = &self.state {
            warn!(
                user_id = %self.user_id,
                event_id = %previous.event_id,
                seat_number = previous.seat_number,
                "Replacing pending reservation"
            );
        }

        self.state = TrackerState::Pending(record.clone());
        info!(
            user_id = %self.user_id,
            event_id = %record.event_id,
            seat_number = record.seat_number,
            "Reservation started"
        );

        let encoded = serde_json::to_string(&record)?;
        self.store.save(&self.key, &encoded).await?;
        Ok(record)
    }

    /// Reconciles local belief with the seat list the server just returned for `event_id`.
    pub async fn reconcile(&mut self, event_id: &str, seats: &[SeatStatus]) -> CoreResult<Reconciliation> {
        let record = match (self.read_persisted().await?, self.pending().cloned()) {
            // A booking whose save failed is newer than what the store still holds
            (Some(saved), Some(local)) if local.timestamp > saved.timestamp => {
                debug!(key = %self.key, "Saved reservation is older than the tracked one, keeping ours");
                Some(local)
            }
            (Some(saved), _) => Some(saved),
            (None, local) => local,
        };

        let Some(record) = record else {
            self.enter_idle();
            return Ok(Reconciliation::Untracked);
        };

        if !self.is_live(&record) {
            self.discard(&record).await?;
            self.enter_idle();
            return Ok(Reconciliation::Lapsed(record));
        }

        if record.event_id != event_id {
            self.enter_idle();
            return Ok(Reconciliation::OtherEvent(record));
        }

        let status = seats
            .iter()
            .find(|seat| record.matches(event_id, seat.seat_number))
            .map(|seat| seat.status);

        if status == Some(SeatState::Reserving) {
            let remaining = self.countdown(&record);
            if !self.is_pending() {
                info!(
                    user_id = %self.user_id,
                    event_id = %record.event_id,
                    seat_number = record.seat_number,
                    remaining = %remaining,
                    "Reservation corroborated by server"
                );
            }
            self.state = TrackerState::Pending(record.clone());
            return Ok(Reconciliation::Tracking { record, remaining });
        }

        info!(
            user_id = %self.user_id,
            event_id = %record.event_id,
            seat_number = record.seat_number,
            status = status.map(|s| s.as_str()).unwrap_or("missing"),
            "Server no longer holds the seat, dropping reservation"
        );
        self.discard(&record).await?;
        self.enter_idle();
        Ok(Reconciliation::Discarded { record, status })
    }

    /// One countdown step. Pending → Expired once no time is left.
    ///
    /// Expiry is never held back by the store: a failed removal is logged and
    /// the stale record is cleaned up by the next `resume` or `reconcile`.
    pub async fn tick(&mut self) -> Tick {
        let TrackerState::Pending(record) = &self.state else {
            return Tick::Idle;
        };

        let remaining = self.countdown(record);
        if !remaining.is_zero() {
            debug!(user_id = %self.user_id, remaining = %remaining, "Tick");
            return Tick::Remaining(remaining);
        }

        let record = record.clone();
        self.state = TrackerState::Expired {
            event_id: record.event_id.clone(),
        };
        info!(
            user_id = %self.user_id,
            event_id = %record.event_id,
            seat_number = record.seat_number,
            "Reservation expired"
        );

        if let Err(e) = self.discard(&record).await {
            error!(user_id = %self.user_id, "Failed to remove expired reservation: {}", e);
        }
        Tick::Expired { record }
    }

    /// Expired → Idle, once the post-expiry refresh has run (or failed).
    pub fn settle(&mut self) {
        if matches!(self.state, TrackerState::Expired { .. }) {
            self.state = TrackerState::Idle;
        }
    }

    /// Pending → Confirmed → Idle after the server accepted the confirmation.
    pub async fn confirm(&mut self) -> CoreResult<ReservationRecord> {
        let record = self.pending().cloned().ok_or(CoreError::NoActiveReservation)?;

        self.state = TrackerState::Confirmed;
        info!(
            user_id = %self.user_id,
            event_id = %record.event_id,
            seat_number = record.seat_number,
            "Reservation confirmed"
        );

        if let Err(e) = self.discard(&record).await {
            error!(user_id = %self.user_id, "Failed to remove confirmed reservation: {}", e);
        }
        self.state = TrackerState::Idle;
        Ok(record)
    }

    /// Any state → Idle. The persisted record is left alone so a later login resumes it.
    pub fn release(&mut self) {
        self.enter_idle();
    }

    fn enter_idle(&mut self) {
        if self.state != TrackerState::Idle {
            debug!(user_id = %self.user_id, from = self.state.name(), "Tracker idle");
        }
        self.state = TrackerState::Idle;
    }

    fn is_live(&self, record: &ReservationRecord) -> bool {
        record.is_live(self.clock.now(), self.settings.hold)
    }

    fn countdown(&self, record: &ReservationRecord) -> Countdown {
        Countdown::until(record.expires_at(self.settings.hold), self.clock.now())
    }

    /// Loads the persisted record. Unreadable or foreign records count as absent and are removed.
    async fn read_persisted(&self) -> CoreResult<Option<ReservationRecord>> {
        let Some(raw) = self.store.load(&self.key).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<ReservationRecord>(&raw) {
            Ok(record) if record.user_id == self.user_id => Ok(Some(record)),
            Ok(record) => {
                warn!(
                    key = %self.key,
                    owner = %record.user_id,
                    "Saved reservation belongs to another user, discarding"
                );
                self.store.remove(&self.key).await?;
                Ok(None)
            }
            Err(e) => {
                warn!(key = %self.key, "Unreadable saved reservation, discarding: {}", e);
                self.store.remove(&self.key).await?;
                Ok(None)
            }
        }
    }

    /// Removes the persisted record only if it is still `record`; a newer
    /// booking written by another session wins.
    async fn discard(&self, record: &ReservationRecord) -> CoreResult<()> {
        match self.read_persisted().await? {
            Some(current) if current != *record => {
                debug!(key = %self.key, "Saved reservation was replaced, leaving it");
                Ok(())
            }
            Some(_) => {
                self.store.remove(&self.key).await?;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::repository::MemoryReservationStore;
    use chrono::{DateTime, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    fn tracker(clock: &ManualClock, store: &Arc<MemoryReservationStore>) -> ReservationLifecycleTracker {
        ReservationLifecycleTracker::new(
            "U1",
            store.clone(),
            Arc::new(clock.clone()),
            TrackerSettings::default(),
        )
    }

    fn seats(seat_number: u32, status: SeatState) -> Vec<SeatStatus> {
        vec![SeatStatus { seat_number, status }]
    }

    #[tokio::test]
    async fn test_begin_persists_record() {
        let clock = ManualClock::new(t0());
        let store = Arc::new(MemoryReservationStore::new());
        let mut tracker = tracker(&clock, &store);

        let record = tracker.begin("E1", 14).await.unwrap();
        assert_eq!(record.timestamp, t0());
        assert!(tracker.is_pending());

        let raw = store.load("reservation_U1").await.unwrap().unwrap();
        let saved: ReservationRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(saved, record);
    }

    #[tokio::test]
    async fn test_tick_outside_pending_is_idle() {
        let clock = ManualClock::new(t0());
        let store = Arc::new(MemoryReservationStore::new());
        let mut tracker = tracker(&clock, &store);

        assert_eq!(tracker.tick().await, Tick::Idle);
    }

    #[tokio::test]
    async fn test_confirm_without_reservation_fails() {
        let clock = ManualClock::new(t0());
        let store = Arc::new(MemoryReservationStore::new());
        let mut tracker = tracker(&clock, &store);

        assert!(matches!(tracker.confirm().await, Err(CoreError::NoActiveReservation)));
    }

    #[tokio::test]
    async fn test_corrupt_record_treated_as_absent() {
        let clock = ManualClock::new(t0());
        let store = Arc::new(MemoryReservationStore::new());
        store.save("reservation_U1", "{not json").await.unwrap();
        let mut tracker = tracker(&clock, &store);

        assert!(tracker.resume().await.unwrap().is_none());
        assert_eq!(tracker.state(), &TrackerState::Idle);
        assert!(store.load("reservation_U1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_other_event_keeps_record() {
        let clock = ManualClock::new(t0());
        let store = Arc::new(MemoryReservationStore::new());
        let mut tracker = tracker(&clock, &store);
        tracker.begin("E1", 14).await.unwrap();

        let outcome = tracker.reconcile("E2", &seats(14, SeatState::Free)).await.unwrap();
        assert!(matches!(outcome, Reconciliation::OtherEvent(_)));
        assert_eq!(tracker.state(), &TrackerState::Idle);
        assert!(store.load("reservation_U1").await.unwrap().is_some());

        // Coming back to the event picks the countdown up again
        clock.advance(Duration::seconds(30));
        let outcome = tracker.reconcile("E1", &seats(14, SeatState::Reserving)).await.unwrap();
        match outcome {
            Reconciliation::Tracking { remaining, .. } => assert_eq!(remaining.as_secs(), 570),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_seat_discards() {
        let clock = ManualClock::new(t0());
        let store = Arc::new(MemoryReservationStore::new());
        let mut tracker = tracker(&clock, &store);
        tracker.begin("E1", 14).await.unwrap();

        let outcome = tracker.reconcile("E1", &seats(3, SeatState::Reserving)).await.unwrap();
        assert!(matches!(outcome, Reconciliation::Discarded { status: None, .. }));
        assert!(store.load("reservation_U1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_settle_only_from_expired() {
        let clock = ManualClock::new(t0());
        let store = Arc::new(MemoryReservationStore::new());
        let mut tracker = tracker(&clock, &store);
        tracker.begin("E1", 14).await.unwrap();

        tracker.settle();
        assert!(tracker.is_pending());

        clock.advance(Duration::minutes(10));
        assert!(matches!(tracker.tick().await, Tick::Expired { .. }));
        assert_eq!(tracker.state(), &TrackerState::Expired { event_id: "E1".to_string() });

        tracker.settle();
        assert_eq!(tracker.state(), &TrackerState::Idle);
    }

    /// Keeps whatever was saved before and refuses every new write.
    struct ReadOnlyStore(MemoryReservationStore);

    #[async_trait::async_trait]
    impl ReservationStore for ReadOnlyStore {
        async fn load(&self, key: &str) -> Result<Option<String>, crate::StoreError> {
            self.0.load(key).await
        }

        async fn save(&self, _key: &str, _value: &str) -> Result<(), crate::StoreError> {
            Err(crate::StoreError("disk full".to_string()))
        }

        async fn remove(&self, key: &str) -> Result<(), crate::StoreError> {
            self.0.remove(key).await
        }
    }

    #[tokio::test]
    async fn test_unsaved_booking_beats_older_saved_record() {
        let clock = ManualClock::new(t0());
        let inner = MemoryReservationStore::new();
        let older = ReservationRecord::new("E2", 3, "U1", t0() - Duration::minutes(2));
        inner
            .save("reservation_U1", &serde_json::to_string(&older).unwrap())
            .await
            .unwrap();
        let store = Arc::new(ReadOnlyStore(inner));
        let mut tracker =
            ReservationLifecycleTracker::new("U1", store.clone(), Arc::new(clock.clone()), TrackerSettings::default());

        assert!(matches!(tracker.begin("E1", 14).await, Err(CoreError::Store(_))));
        assert!(tracker.is_pending());

        clock.advance(Duration::seconds(1));
        let outcome = tracker.reconcile("E1", &seats(14, SeatState::Reserving)).await.unwrap();
        match outcome {
            Reconciliation::Tracking { record, remaining } => {
                assert_eq!(record.event_id, "E1");
                assert_eq!(record.seat_number, 14);
                assert_eq!(remaining.as_secs(), 599);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(tracker.is_pending());
        // The older booking of another event is still there for its own page
        assert!(store.load("reservation_U1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_foreign_record_discarded() {
        let clock = ManualClock::new(t0());
        let store = Arc::new(MemoryReservationStore::new());
        let foreign = ReservationRecord::new("E1", 2, "U9", t0());
        store
            .save("reservation_U1", &serde_json::to_string(&foreign).unwrap())
            .await
            .unwrap();
        let mut tracker = tracker(&clock, &store);

        assert!(tracker.resume().await.unwrap().is_none());
        assert!(store.load("reservation_U1").await.unwrap().is_none());
    }
}
