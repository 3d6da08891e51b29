pub mod clock;
pub mod countdown;
pub mod repository;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use countdown::Countdown;
pub use repository::{reservation_key, ApiError, EventsApi, MemoryReservationStore, ReservationStore, StoreError};
pub use tracker::{Reconciliation, ReservationLifecycleTracker, Tick, TrackerSettings, TrackerState};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("No active reservation")]
    NoActiveReservation,
    #[error("Reservation store failed: {0}")]
    Store(#[from] StoreError),
    #[error("Reservation record could not be encoded: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
