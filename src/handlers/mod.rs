pub mod admin;
pub mod bookings;
pub mod facilities;
pub mod health;
pub mod payments;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use axum::Router;
use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{Booking, FacilityType, Slot};
use crate::state::AppState;

/// All routes, without middleware layers.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/facilities", get(facilities::list_facilities))
        .route("/api/facilities/:id", get(facilities::get_facility))
        .route("/api/slots", get(bookings::get_slots))
        .route(
            "/api/bookings/available-slots",
            get(bookings::available_slots),
        )
        .route("/api/bookings", post(bookings::create_booking))
        .route(
            "/api/bookings/email/:email",
            get(bookings::bookings_for_email),
        )
        .route(
            "/api/bookings/user/:user_id",
            get(bookings::bookings_for_user),
        )
        .route(
            "/api/bookings/date/:date/type/:type",
            get(bookings::bookings_for_date_and_type),
        )
        .route("/api/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/api/payments/callback", post(payments::payment_callback))
        .route("/api/admin/bookings", get(admin::list_bookings))
        .route("/api/admin/bookings/events", get(admin::events_stream))
        .route(
            "/api/admin/bookings/complete-elapsed",
            post(admin::complete_elapsed),
        )
        .route(
            "/api/admin/bookings/:id",
            get(admin::get_booking)
                .put(admin::update_booking)
                .delete(admin::delete_booking),
        )
        .route(
            "/api/admin/bookings/:id/mark-offline-paid",
            post(admin::mark_offline_paid),
        )
        .route(
            "/api/admin/bookings/:id/refund",
            post(admin::refund_booking),
        )
        .route(
            "/api/admin/facilities",
            get(facilities::admin_list_facilities).post(facilities::create_facility),
        )
        .route(
            "/api/admin/facilities/:id",
            put(facilities::update_facility).delete(facilities::delete_facility),
        )
        .route(
            "/api/admin/facilities/:id/availability",
            post(facilities::set_availability),
        )
        .with_state(state)
}

/// Bearer-token check shared by the admin routes.
pub(crate) fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid date (expected YYYY-MM-DD): {raw}")))
}

pub(crate) fn parse_facility_type(raw: &str) -> Result<FacilityType, AppError> {
    FacilityType::parse(raw)
        .ok_or_else(|| AppError::BadRequest(format!("unknown facility type: {raw}")))
}

#[derive(Debug, Serialize)]
pub struct SlotResponse {
    #[serde(flatten)]
    pub slot: Slot,
    pub label: String,
    pub duration_minutes: i64,
}

impl From<Slot> for SlotResponse {
    fn from(slot: Slot) -> Self {
        Self {
            label: slot.label(),
            duration_minutes: slot.duration_minutes(),
            slot,
        }
    }
}

/// A booking as returned over HTTP: the stored record plus its display label.
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    #[serde(flatten)]
    pub booking: Booking,
    pub slot_label: String,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            slot_label: booking.slot.label(),
            booking,
        }
    }
}

pub(crate) fn booking_list(bookings: Vec<Booking>) -> Vec<BookingResponse> {
    bookings.into_iter().map(BookingResponse::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_auth() {
        let mut headers = HeaderMap::new();
        assert!(check_auth(&headers, "secret").is_err());

        headers.insert("authorization", "Bearer wrong".parse().unwrap());
        assert!(check_auth(&headers, "secret").is_err());

        headers.insert("authorization", "Bearer secret".parse().unwrap());
        assert!(check_auth(&headers, "secret").is_ok());
    }

    #[test]
    fn test_slot_response_has_label() {
        let slot = Slot::from_hhmm("12:00", "13:00").unwrap();
        let json = serde_json::to_value(SlotResponse::from(slot)).unwrap();
        assert_eq!(json["start_time"], "12:00");
        assert_eq!(json["end_time"], "13:00");
        assert_eq!(json["label"], "12:00 PM - 1:00 PM");
        assert_eq!(json["duration_minutes"], 60);
    }
}
