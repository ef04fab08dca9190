use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db::queries::{self, StatusUpdate};
use crate::errors::BookingError;
use crate::models::{Booking, BookingChanges, BookingStatus, CustomerInfo};
use crate::services::catalog::SlotCatalog;

/// Result of a status change. `changed` is false when the booking was
/// already in the target state and the call was a no-op.
#[derive(Debug, Clone)]
pub struct Transition {
    pub booking: Booking,
    pub changed: bool,
}

fn load(conn: &Connection, id: &str) -> Result<Booking, BookingError> {
    queries::get_booking_by_id(conn, id)?
        .ok_or_else(|| BookingError::NotFound(format!("booking {id}")))
}

/// Moves `id` to `to` if the transition table allows it. Repeating a
/// transition the booking has already made is a no-op.
fn transition(
    conn: &Connection,
    id: &str,
    to: BookingStatus,
    update: &StatusUpdate,
) -> Result<Transition, BookingError> {
    let current = load(conn, id)?;

    if current.status == to {
        return Ok(Transition {
            booking: current,
            changed: false,
        });
    }
    if !current.status.can_transition_to(to) {
        return Err(BookingError::InvalidTransition {
            from: current.status,
            to,
        });
    }

    if !queries::transition_booking_status(conn, id, current.status, to, update)? {
        // Lost a race with another status change; report against what won.
        let now = load(conn, id)?;
        if now.status == to {
            return Ok(Transition {
                booking: now,
                changed: false,
            });
        }
        return Err(BookingError::InvalidTransition {
            from: now.status,
            to,
        });
    }

    let booking = load(conn, id)?;
    tracing::info!(
        booking_id = %id,
        from = %current.status,
        to = %booking.status,
        "booking status changed"
    );
    Ok(Transition {
        booking,
        changed: true,
    })
}

/// Payment captured. Idempotent: confirming a `CONFIRMED` booking again
/// leaves it untouched.
pub fn confirm_payment(
    conn: &Connection,
    id: &str,
    payment_id: Option<&str>,
) -> Result<Transition, BookingError> {
    let update = StatusUpdate {
        payment_id,
        ..Default::default()
    };
    transition(conn, id, BookingStatus::Confirmed, &update)
}

/// Payment capture failed or was reversed.
pub fn fail_payment(conn: &Connection, id: &str) -> Result<Transition, BookingError> {
    transition(conn, id, BookingStatus::Failed, &StatusUpdate::default())
}

/// Administrator recorded a cash or offline payment.
pub fn mark_offline_paid(conn: &Connection, id: &str) -> Result<Transition, BookingError> {
    let payment_id = format!("OFFLINE-{}", uuid::Uuid::new_v4());
    let update = StatusUpdate {
        payment_id: Some(&payment_id),
        ..Default::default()
    };
    transition(conn, id, BookingStatus::Confirmed, &update)
}

/// Customer cancellation. Only the booking's own email may cancel, and only
/// before the slot starts.
pub fn cancel_booking(
    conn: &Connection,
    id: &str,
    email: &str,
    reason: Option<&str>,
    now: &NaiveDateTime,
) -> Result<Transition, BookingError> {
    let booking = load(conn, id)?;
    if !booking.customer_email.eq_ignore_ascii_case(email.trim()) {
        return Err(BookingError::NotFound(format!("booking {id}")));
    }
    if booking.status.is_active() && booking.starts_at() <= *now {
        return Err(BookingError::SlotStarted);
    }

    let note = reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| format!("Cancelled by customer: {r}"));
    let update = StatusUpdate {
        note: note.as_deref(),
        ..Default::default()
    };
    transition(conn, id, BookingStatus::Cancelled, &update)
}

/// Refund after a failed payment. The amount is stored in the same write as
/// the status change.
pub fn refund_booking(conn: &Connection, id: &str, amount: f64) -> Result<Transition, BookingError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(BookingError::Validation(format!("invalid refund amount: {amount}")));
    }

    let update = StatusUpdate {
        refund_amount: Some(amount),
        ..Default::default()
    };
    transition(conn, id, BookingStatus::Refunded, &update)
}

/// Marks every confirmed booking whose slot has ended as completed.
pub fn complete_elapsed(conn: &Connection, now: &NaiveDateTime) -> Result<Vec<Booking>, BookingError> {
    let ids = queries::complete_elapsed_bookings(conn, now)?;
    if !ids.is_empty() {
        tracing::info!(count = ids.len(), "completed elapsed bookings");
    }

    let mut completed = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(b) = queries::get_booking_by_id(conn, &id)? {
            completed.push(b);
        }
    }
    Ok(completed)
}

/// Administrative edit. Deliberately skips the conflict check and the
/// transition table so staff can resolve disputes; the slot must still be a
/// catalog entry.
pub fn admin_update(
    conn: &Connection,
    catalog: &SlotCatalog,
    id: &str,
    changes: BookingChanges,
) -> Result<Booking, BookingError> {
    let mut booking = load(conn, id)?;

    if let Some(slot) = changes.slot {
        if !catalog.contains(booking.facility_type, &slot) {
            return Err(BookingError::InvalidSlot(slot.key()));
        }
        booking.slot = slot;
    }
    if let Some(date) = changes.booking_date {
        booking.booking_date = date;
    }

    if changes.customer_name.is_some()
        || changes.customer_email.is_some()
        || changes.customer_phone.is_some()
    {
        let customer = CustomerInfo {
            name: changes.customer_name.unwrap_or(booking.customer_name.clone()),
            email: changes.customer_email.unwrap_or(booking.customer_email.clone()),
            phone: changes.customer_phone.unwrap_or(booking.customer_phone.clone()),
        }
        .validated()
        .map_err(BookingError::Validation)?;
        booking.customer_name = customer.name;
        booking.customer_email = customer.email;
        booking.customer_phone = customer.phone;
    }

    if let Some(price) = changes.price {
        if !price.is_finite() || price < 0.0 {
            return Err(BookingError::Validation(format!("invalid price: {price}")));
        }
        booking.price = price;
    }
    if let Some(status) = changes.status {
        booking.status = status;
    }
    if let Some(notes) = changes.notes {
        booking.notes = Some(notes).filter(|n| !n.trim().is_empty());
    }
    booking.updated_at = queries::now_ts();

    if booking.status.is_active()
        && queries::slot_is_held(
            conn,
            &booking.facility_id,
            &booking.booking_date,
            &booking.slot,
            Some(&booking.id),
        )?
    {
        tracing::warn!(
            booking_id = %booking.id,
            facility_id = %booking.facility_id,
            date = %booking.booking_date,
            slot = %booking.slot.key(),
            "admin update double-books an active slot"
        );
    }

    if !queries::update_booking(conn, &booking)? {
        return Err(BookingError::NotFound(format!("booking {id}")));
    }
    tracing::info!(booking_id = %booking.id, status = %booking.status, "booking updated by admin");
    Ok(booking)
}

pub fn admin_delete(conn: &Connection, id: &str) -> Result<Booking, BookingError> {
    let booking = load(conn, id)?;
    if !queries::delete_booking(conn, id)? {
        return Err(BookingError::NotFound(format!("booking {id}")));
    }
    tracing::info!(booking_id = %id, "booking deleted by admin");
    Ok(booking)
}
