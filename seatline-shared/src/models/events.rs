use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seat status as reported by `GET /events/{id}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SeatState {
    Free,
    Reserving,
    Booked,
    /// Any status string this client doesn't know. Never corroborates a reservation.
    #[serde(other)]
    Unknown,
}

impl SeatState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatState::Free => "free",
            SeatState::Reserving => "reserving",
            SeatState::Booked => "booked",
            SeatState::Unknown => "unknown",
        }
    }

    /// Human label used in the seat map legend.
    pub fn label(&self) -> &'static str {
        match self {
            SeatState::Free => "Free",
            SeatState::Reserving => "On hold",
            SeatState::Booked => "Booked",
            SeatState::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SeatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatStatus {
    pub seat_number: u32,
    pub status: SeatState,
}

/// Entry of `GET /events/all`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventSummary {
    pub id: String,
    pub title: String,
    pub date: String,
    pub total_seats: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventDetails {
    pub id: String,
    pub title: String,
    pub date: String,
    pub total_seats: u32,
    #[serde(default)]
    pub seats: Vec<SeatStatus>,
}

impl EventDetails {
    pub fn seat(&self, seat_number: u32) -> Option<&SeatStatus> {
        self.seats.iter().find(|s| s.seat_number == seat_number)
    }

    pub fn counts(&self) -> SeatCounts {
        SeatCounts::tally(&self.seats)
    }
}

/// Per-status tally of an event's seats.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatCounts {
    pub free: u32,
    pub reserving: u32,
    pub booked: u32,
}

impl SeatCounts {
    /// Unknown statuses are not counted.
    pub fn tally(seats: &[SeatStatus]) -> Self {
        seats.iter().fold(Self::default(), |mut acc, seat| {
            match seat.status {
                SeatState::Free => acc.free += 1,
                SeatState::Reserving => acc.reserving += 1,
                SeatState::Booked => acc.booked += 1,
                SeatState::Unknown => {}
            }
            acc
        })
    }
}

/// Admin payload for `POST /events`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateEventRequest {
    pub event: EventDraft,
    pub layout: SeatLayout,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventDraft {
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub total_seats: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatLayout {
    pub rows: u32,
    pub seats_per_row: u32,
    pub start_number: u32,
}

impl SeatLayout {
    /// Number of seats the layout creates, `None` when it does not fit a seat number.
    pub fn capacity(&self) -> Option<u32> {
        let capacity = self.rows.checked_mul(self.seats_per_row)?;
        // The last seat is numbered `start_number + capacity - 1`
        self.start_number.checked_add(capacity.saturating_sub(1))?;
        Some(capacity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateEventResponse {
    pub event_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_details_parse() {
        let body = r#"{
            "id": "E1",
            "title": "Quartet",
            "date": "2026-11-01T19:00:00Z",
            "total_seats": 3,
            "seats": [
                {"seat_number": 1, "status": "free"},
                {"seat_number": 2, "status": "reserving"},
                {"seat_number": 3, "status": "sold_out"}
            ]
        }"#;

        let details: EventDetails = serde_json::from_str(body).unwrap();
        assert_eq!(details.seat(2).unwrap().status, SeatState::Reserving);
        assert_eq!(details.seat(3).unwrap().status, SeatState::Unknown);
        assert!(details.seat(4).is_none());
    }

    #[test]
    fn test_layout_capacity_overflow() {
        let layout = SeatLayout { rows: 2, seats_per_row: 5, start_number: 1 };
        assert_eq!(layout.capacity(), Some(10));

        let huge = SeatLayout { rows: 65536, seats_per_row: 65536, start_number: 1 };
        assert_eq!(huge.capacity(), None);

        let late_start = SeatLayout { rows: 1, seats_per_row: 10, start_number: u32::MAX - 3 };
        assert_eq!(late_start.capacity(), None);
    }

    #[test]
    fn test_seat_counts_skip_unknown() {
        let seats = vec![
            SeatStatus { seat_number: 1, status: SeatState::Free },
            SeatStatus { seat_number: 2, status: SeatState::Free },
            SeatStatus { seat_number: 3, status: SeatState::Booked },
            SeatStatus { seat_number: 4, status: SeatState::Unknown },
        ];
        assert_eq!(
            SeatCounts::tally(&seats),
            SeatCounts { free: 2, reserving: 0, booked: 1 }
        );
    }
}
