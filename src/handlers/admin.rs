use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_stream::StreamExt;

use super::{booking_list, check_auth, parse_date, BookingResponse};
use crate::db::queries;
use crate::errors::{AppError, BookingError};
use crate::models::{Booking, BookingChanges, BookingEventKind, BookingStatus, Slot};
use crate::services::{events, lifecycle, notify};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            BookingStatus::parse(raw)
                .ok_or_else(|| AppError::BadRequest(format!("unknown status: {raw}")))?,
        ),
    };
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let bookings = {
        let db = state.db()?;
        queries::get_all_bookings(&db, status, limit)?
    };
    Ok(Json(booking_list(bookings)))
}

// GET /api/admin/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = {
        let db = state.db()?;
        queries::get_booking_by_id(&db, &id)?
    };
    let booking = booking.ok_or_else(|| BookingError::NotFound(format!("booking {id}")))?;
    Ok(Json(booking.into()))
}

// PUT /api/admin/bookings/:id
#[derive(Deserialize, Default)]
pub struct UpdateBookingRequest {
    #[serde(alias = "customerName")]
    pub customer_name: Option<String>,
    #[serde(alias = "customerEmail")]
    pub customer_email: Option<String>,
    #[serde(alias = "customerPhone")]
    pub customer_phone: Option<String>,
    #[serde(alias = "date", alias = "bookingDate")]
    pub booking_date: Option<String>,
    #[serde(alias = "startTime")]
    pub start_time: Option<String>,
    #[serde(alias = "endTime")]
    pub end_time: Option<String>,
    pub slot: Option<String>,
    pub price: Option<f64>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

impl UpdateBookingRequest {
    fn into_changes(self) -> Result<BookingChanges, AppError> {
        let slot = match (&self.start_time, &self.end_time, &self.slot) {
            (None, None, None) => None,
            (Some(start), Some(end), _) => Some(Slot::from_hhmm(start, end)),
            (None, None, Some(label)) => Some(Slot::parse_label(label)),
            _ => {
                return Err(AppError::BadRequest(
                    "start_time and end_time must be given together".to_string(),
                ))
            }
        }
        .transpose()
        .map_err(|e| BookingError::InvalidSlot(e.to_string()))?;

        let status = self
            .status
            .as_deref()
            .map(|raw| {
                BookingStatus::parse(raw)
                    .ok_or_else(|| AppError::BadRequest(format!("unknown status: {raw}")))
            })
            .transpose()?;

        Ok(BookingChanges {
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            booking_date: self.booking_date.as_deref().map(parse_date).transpose()?,
            slot,
            price: self.price,
            status,
            notes: self.notes,
        })
    }
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let changes = req.into_changes()?;

    let booking = {
        let db = state.db()?;
        lifecycle::admin_update(&db, &state.config.catalog, &id, changes)?
    };
    events::publish(&state.events_tx, BookingEventKind::Updated, &booking);

    Ok(Json(booking.into()))
}

// DELETE /api/admin/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = {
        let db = state.db()?;
        lifecycle::admin_delete(&db, &id)?
    };
    events::publish(&state.events_tx, BookingEventKind::Deleted, &booking);

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/admin/bookings/:id/mark-offline-paid
pub async fn mark_offline_paid(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let result = {
        let db = state.db()?;
        lifecycle::mark_offline_paid(&db, &id)?
    };
    if result.changed {
        events::publish(&state.events_tx, BookingEventKind::StatusChanged, &result.booking);
        notify::send_confirmation(state.notifier.as_ref(), &result.booking).await;
    }

    Ok(Json(result.booking.into()))
}

// POST /api/admin/bookings/:id/refund
#[derive(Deserialize)]
pub struct RefundRequest {
    #[serde(alias = "refundAmount")]
    pub amount: f64,
}

pub async fn refund_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<RefundRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let result = {
        let db = state.db()?;
        lifecycle::refund_booking(&db, &id, req.amount)?
    };
    if result.changed {
        events::publish(&state.events_tx, BookingEventKind::StatusChanged, &result.booking);
    }

    Ok(Json(result.booking.into()))
}

/// Completes every confirmed booking that ended before `now` and announces
/// each one on the event channel.
pub fn run_completion_sweep(state: &AppState, now: &NaiveDateTime) -> Result<Vec<Booking>, AppError> {
    let completed = {
        let db = state.db()?;
        lifecycle::complete_elapsed(&db, now)?
    };
    for booking in &completed {
        events::publish(&state.events_tx, BookingEventKind::StatusChanged, booking);
    }
    Ok(completed)
}

// POST /api/admin/bookings/complete-elapsed
#[derive(Serialize)]
pub struct SweepResponse {
    completed: usize,
    bookings: Vec<BookingResponse>,
}

pub async fn complete_elapsed(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SweepResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let now = chrono::Local::now().naive_local();
    let completed = run_completion_sweep(&state, &now)?;

    Ok(Json(SweepResponse {
        completed: completed.len(),
        bookings: booking_list(completed),
    }))
}

// GET /api/admin/bookings/events
#[derive(Deserialize)]
pub struct SseQuery {
    pub token: Option<String>,
}

pub async fn events_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SseQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    // EventSource can't set headers, so the token comes in the query.
    let token = query.token.as_deref().unwrap_or("");
    if token.is_empty() || token != state.config.admin_token {
        return Err(AppError::Unauthorized);
    }

    let live = BroadcastStream::new(state.events_tx.subscribe()).filter_map(|result| match result {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok::<_, Infallible>(Event::default().event("booking_event").data(data)))
        }
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "booking event subscriber lagged");
            None
        }
    });

    let keepalive = IntervalStream::new(tokio::time::interval(Duration::from_secs(30)))
        .map(|_| Ok::<_, Infallible>(Event::default().comment("keepalive")));

    Ok(Sse::new(live.merge(keepalive)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_with_label() {
        let req = UpdateBookingRequest {
            slot: Some("6:00 PM - 7:00 PM".to_string()),
            status: Some("cancelled".to_string()),
            ..Default::default()
        };
        let changes = req.into_changes().unwrap();
        assert_eq!(changes.slot.unwrap().key(), "18:00-19:00");
        assert_eq!(changes.status, Some(BookingStatus::Cancelled));
    }

    #[test]
    fn test_update_request_rejects_half_range() {
        let req = UpdateBookingRequest {
            start_time: Some("09:00".to_string()),
            ..Default::default()
        };
        assert!(matches!(req.into_changes(), Err(AppError::BadRequest(_))));

        let req = UpdateBookingRequest {
            status: Some("ON_HOLD".to_string()),
            ..Default::default()
        };
        assert!(matches!(req.into_changes(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_update_request_bad_slot() {
        let req = UpdateBookingRequest {
            start_time: Some("10:00".to_string()),
            end_time: Some("09:00".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            req.into_changes(),
            Err(AppError::Booking(BookingError::InvalidSlot(_)))
        ));
    }
}
