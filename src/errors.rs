use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::BookingStatus;

/// Failures of the booking core. Each variant maps to one distinct message
/// the caller can act on.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("requested time is not a bookable slot: {0}")]
    InvalidSlot(String),

    #[error("facility is not available for booking: {0}")]
    FacilityUnavailable(String),

    #[error("that slot was just taken by someone else, please pick another")]
    Conflict,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("booking cannot move from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    #[error("the booked slot has already started")]
    SlotStarted,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Booking(BookingError::Database(e))
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Booking(e) => match e {
                BookingError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
                BookingError::InvalidSlot(_) => (StatusCode::BAD_REQUEST, "invalid_slot"),
                BookingError::FacilityUnavailable(_) => {
                    (StatusCode::NOT_FOUND, "facility_unavailable")
                }
                BookingError::Conflict => (StatusCode::CONFLICT, "slot_taken"),
                BookingError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                BookingError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, "invalid_transition")
                }
                BookingError::SlotStarted => (StatusCode::CONFLICT, "slot_started"),
                BookingError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        // Database details stay in the log.
        let message = if status.is_server_error() {
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = serde_json::json!({ "error": message, "code": code });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_and_validation_are_distinct() {
        let conflict = AppError::from(BookingError::Conflict).status_and_code();
        let invalid = AppError::from(BookingError::Validation("bad email".into())).status_and_code();
        assert_eq!(conflict, (StatusCode::CONFLICT, "slot_taken"));
        assert_eq!(invalid, (StatusCode::UNPROCESSABLE_ENTITY, "validation"));
    }

    #[test]
    fn test_database_error_is_internal() {
        let err = AppError::from(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
