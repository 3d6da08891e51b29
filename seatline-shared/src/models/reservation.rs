use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The locally persisted copy of a user's pending seat reservation.
///
/// Stored as JSON under `reservation_{userId}`; field names match what the
/// web panel wrote so records stay readable across clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRecord {
    pub event_id: String,
    pub seat_number: u32,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ReservationRecord {
    pub fn new(event_id: impl Into<String>, seat_number: u32, user_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_id: event_id.into(),
            seat_number,
            user_id: user_id.into(),
            timestamp,
        }
    }

    pub fn expires_at(&self, hold: Duration) -> DateTime<Utc> {
        self.timestamp + hold
    }

    /// Live while strictly less than `hold` has elapsed.
    pub fn is_live(&self, now: DateTime<Utc>, hold: Duration) -> bool {
        now - self.timestamp < hold
    }

    pub fn matches(&self, event_id: &str, seat_number: u32) -> bool {
        self.event_id == event_id && self.seat_number == seat_number
    }
}
