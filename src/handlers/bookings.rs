use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::{booking_list, parse_date, parse_facility_type, BookingResponse, SlotResponse};
use crate::errors::{AppError, BookingError};
use crate::models::{BookingEventKind, CustomerInfo, NewBooking, Slot};
use crate::services::{events, lifecycle, scheduling};
use crate::state::AppState;

// GET /api/slots
#[derive(Deserialize)]
pub struct SlotsQuery {
    #[serde(rename = "type")]
    pub facility_type: Option<String>,
}

pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<SlotResponse>>, AppError> {
    let raw = query
        .facility_type
        .ok_or_else(|| AppError::BadRequest("type is required".to_string()))?;
    let facility_type = parse_facility_type(&raw)?;

    let slots = state.config.catalog.all_slots(facility_type);
    Ok(Json(slots.iter().copied().map(SlotResponse::from).collect()))
}

// GET /api/bookings/available-slots
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlotsQuery {
    pub date: String,
    pub facility_id: String,
}

pub async fn available_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Vec<SlotResponse>>, AppError> {
    let date = parse_date(&query.date)?;

    let slots = {
        let db = state.db()?;
        scheduling::available_slots(&db, &state.config.catalog, &query.facility_id, &date)?
    };

    Ok(Json(slots.into_iter().map(SlotResponse::from).collect()))
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    #[serde(alias = "facilityId")]
    pub facility_id: String,
    #[serde(alias = "date", alias = "bookingDate")]
    pub booking_date: String,
    #[serde(alias = "startTime")]
    pub start_time: Option<String>,
    #[serde(alias = "endTime")]
    pub end_time: Option<String>,
    /// Display label such as `9:00 AM - 10:00 AM`, used when the explicit
    /// times are absent.
    #[serde(alias = "timeSlot")]
    pub slot: Option<String>,
    #[serde(alias = "customerName")]
    pub customer_name: String,
    #[serde(alias = "customerEmail")]
    pub customer_email: String,
    #[serde(alias = "customerPhone")]
    pub customer_phone: String,
    pub price: Option<f64>,
    #[serde(alias = "userId")]
    pub user_id: Option<i64>,
    #[serde(alias = "matchType")]
    pub match_type: Option<String>,
    #[serde(alias = "matchOvers")]
    pub match_overs: Option<i32>,
}

impl CreateBookingRequest {
    fn requested_slot(&self) -> Result<Slot, BookingError> {
        let slot = match (&self.start_time, &self.end_time, &self.slot) {
            (Some(start), Some(end), _) => Slot::from_hhmm(start, end),
            (None, None, Some(label)) => Slot::parse_label(label),
            _ => {
                return Err(BookingError::Validation(
                    "either start_time and end_time or slot is required".to_string(),
                ))
            }
        };
        slot.map_err(|e| BookingError::InvalidSlot(e.to_string()))
    }
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let booking_date = parse_date(&req.booking_date)?;
    let slot = req.requested_slot()?;

    let request = NewBooking {
        facility_id: req.facility_id,
        booking_date,
        slot,
        customer: CustomerInfo {
            name: req.customer_name,
            email: req.customer_email,
            phone: req.customer_phone,
        },
        price: req.price,
        user_id: req.user_id,
        match_type: req.match_type,
        match_overs: req.match_overs,
    };

    let booking = {
        let db = state.db()?;
        scheduling::create_booking(&db, &state.config.catalog, request)?
    };
    events::publish(&state.events_tx, BookingEventKind::Created, &booking);

    Ok((StatusCode::CREATED, Json(booking.into())))
}

// GET /api/bookings/email/:email
pub async fn bookings_for_email(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let bookings = {
        let db = state.db()?;
        crate::db::queries::get_bookings_for_email(&db, &email)?
    };
    Ok(Json(booking_list(bookings)))
}

// GET /api/bookings/user/:user_id
pub async fn bookings_for_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let bookings = {
        let db = state.db()?;
        crate::db::queries::get_bookings_for_user(&db, user_id)?
    };
    Ok(Json(booking_list(bookings)))
}

// GET /api/bookings/date/:date/type/:type
pub async fn bookings_for_date_and_type(
    State(state): State<Arc<AppState>>,
    Path((date, facility_type)): Path<(String, String)>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let date = parse_date(&date)?;
    let facility_type = parse_facility_type(&facility_type)?;

    let bookings = {
        let db = state.db()?;
        crate::db::queries::get_bookings_for_date_and_type(&db, &date, facility_type)?
    };
    Ok(Json(booking_list(bookings)))
}

// POST /api/bookings/:id/cancel
#[derive(Deserialize)]
pub struct CancelRequest {
    pub email: String,
    pub reason: Option<String>,
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let now = chrono::Local::now().naive_local();

    let result = {
        let db = state.db()?;
        lifecycle::cancel_booking(&db, &id, &req.email, req.reason.as_deref(), &now)?
    };
    if result.changed {
        events::publish(&state.events_tx, BookingEventKind::StatusChanged, &result.booking);
    }

    Ok(Json(result.booking.into()))
}
