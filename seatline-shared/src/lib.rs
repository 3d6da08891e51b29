pub mod models;
pub mod pii;

pub use models::events::{
    CreateEventRequest, CreateEventResponse, EventDetails, EventDraft, EventSummary, SeatCounts,
    SeatLayout, SeatState, SeatStatus,
};
pub use models::requests::{ApiErrorBody, BookSeatRequest, ConfirmRequest};
pub use models::reservation::ReservationRecord;
pub use pii::Masked;
