use serde::{Deserialize, Serialize};

/// Body of `POST /events/{id}/book`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookSeatRequest {
    pub seat_number: u32,
    pub user_id: String,
}

/// Body of `POST /events/{id}/confirm`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub user_id: String,
    pub seat_number: u32,
}

/// Error payload the booking API returns on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiErrorBody {
    pub error: String,
}
