use seatline_core::{ApiError, CoreError};

use crate::notice::Notice;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Sign in first")]
    NotSignedIn,
    #[error("Open an event first")]
    NoEventSelected,
    #[error("No active reservation")]
    NoReservation,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl AppError {
    /// Turns the failure into what the user sees. `action` names what was attempted,
    /// e.g. "Booking failed".
    pub fn into_notice(self, action: &str) -> Notice {
        match self {
            // Server-side business errors are shown verbatim
            AppError::Api(ApiError::Rejected { message, .. }) => Notice::error(format!("Error: {}", message)),
            AppError::Api(err) => Notice::error(format!("{}: {}", action, err)),
            AppError::Core(err) => {
                tracing::error!("{}: {}", action, err);
                Notice::error(format!("{}: {}", action, err))
            }
            other => Notice::error(other.to_string()),
        }
    }
}
