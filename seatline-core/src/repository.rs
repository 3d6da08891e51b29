use async_trait::async_trait;
use seatline_shared::{
    BookSeatRequest, ConfirmRequest, CreateEventRequest, CreateEventResponse, EventDetails, EventSummary,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// Persistence key of a user's reservation record.
pub fn reservation_key(user_id: &str) -> String {
    format!("reservation_{}", user_id)
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// String key-value storage for reservation records.
///
/// `remove` must delete the key; a missing key is not an error.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local store. Used when nothing should outlive the session, and in tests.
#[derive(Debug, Default)]
pub struct MemoryReservationStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ReservationStore for MemoryReservationStore {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries().get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, reset).
    #[error("Network error: {0}")]
    Transport(String),
    /// The server answered with a non-success status; `message` is its `error` field.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// The booking HTTP API as consumed by the client.
#[async_trait]
pub trait EventsApi: Send + Sync {
    async fn list_events(&self) -> Result<Vec<EventSummary>, ApiError>;

    async fn event_details(&self, event_id: &str) -> Result<EventDetails, ApiError>;

    /// Puts the seat into `reserving` server-side with the server's own hold window.
    async fn book_seat(&self, event_id: &str, request: &BookSeatRequest) -> Result<(), ApiError>;

    /// Converts a `reserving` seat into `booked`.
    async fn confirm_seat(&self, event_id: &str, request: &ConfirmRequest) -> Result<(), ApiError>;

    async fn create_event(&self, request: &CreateEventRequest) -> Result<CreateEventResponse, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_remove_deletes_key() {
        let store = MemoryReservationStore::new();
        store.save("reservation_U1", "{}").await.unwrap();
        assert_eq!(store.load("reservation_U1").await.unwrap().as_deref(), Some("{}"));

        store.remove("reservation_U1").await.unwrap();
        assert!(store.load("reservation_U1").await.unwrap().is_none());
        // Removing twice is fine
        store.remove("reservation_U1").await.unwrap();
    }

    #[test]
    fn test_key_namespace() {
        assert_eq!(reservation_key("U1"), "reservation_U1");
    }
}
