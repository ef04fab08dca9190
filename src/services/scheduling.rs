use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::BookingError;
use crate::models::{Booking, BookingStatus, Facility, NewBooking, Slot};
use crate::services::catalog::SlotCatalog;

/// Catalog slots for the facility's type that no `PENDING` or `CONFIRMED`
/// booking holds on `date`, in catalog order.
///
/// An unknown or administratively disabled facility yields no slots rather
/// than an error.
pub fn available_slots(
    conn: &Connection,
    catalog: &SlotCatalog,
    facility_id: &str,
    date: &NaiveDate,
) -> Result<Vec<Slot>, BookingError> {
    let facility = match queries::get_facility(conn, facility_id)? {
        Some(f) if f.is_available => f,
        _ => return Ok(vec![]),
    };

    let held = queries::get_held_slots(conn, facility_id, date)?;

    Ok(catalog
        .all_slots(facility.facility_type)
        .iter()
        .filter(|slot| !held.contains(slot))
        .copied()
        .collect())
}

/// Creates a `PENDING` booking if the slot is still free.
///
/// Input is validated before anything touches the ledger; the final
/// free-slot check and the insert are a single atomic step, so of several
/// concurrent requests for the same facility, date and slot exactly one
/// succeeds and the rest get [`BookingError::Conflict`].
pub fn create_booking(
    conn: &Connection,
    catalog: &SlotCatalog,
    request: NewBooking,
) -> Result<Booking, BookingError> {
    let customer = request
        .customer
        .validated()
        .map_err(BookingError::Validation)?;

    if let Some(overs) = request.match_overs {
        if overs <= 0 {
            return Err(BookingError::Validation(
                "match overs must be a positive number".to_string(),
            ));
        }
    }
    if let Some(price) = request.price {
        if !price.is_finite() || price < 0.0 {
            return Err(BookingError::Validation(format!("invalid price: {price}")));
        }
    }

    let facility = bookable_facility(conn, &request.facility_id)?;

    if !catalog.contains(facility.facility_type, &request.slot) {
        return Err(BookingError::InvalidSlot(request.slot.key()));
    }

    let now = queries::now_ts();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        facility_id: facility.id.clone(),
        facility_type: facility.facility_type,
        facility_name: facility.name.clone(),
        booking_date: request.booking_date,
        slot: request.slot,
        price: request
            .price
            .unwrap_or_else(|| slot_price(&facility, &request.slot)),
        customer_name: customer.name,
        customer_email: customer.email,
        customer_phone: customer.phone,
        user_id: request.user_id,
        match_type: request
            .match_type
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty()),
        match_overs: request.match_overs,
        status: BookingStatus::Pending,
        payment_id: None,
        refund_amount: 0.0,
        notes: None,
        created_at: now,
        updated_at: now,
    };

    if !queries::insert_booking_if_slot_free(conn, &booking)? {
        tracing::info!(
            facility_id = %booking.facility_id,
            date = %booking.booking_date,
            slot = %booking.slot.key(),
            "slot already taken"
        );
        return Err(BookingError::Conflict);
    }

    tracing::info!(
        booking_id = %booking.id,
        facility_id = %booking.facility_id,
        date = %booking.booking_date,
        slot = %booking.slot.key(),
        "booking created"
    );

    Ok(booking)
}

fn bookable_facility(conn: &Connection, facility_id: &str) -> Result<Facility, BookingError> {
    match queries::get_facility(conn, facility_id)? {
        Some(f) if f.is_available => Ok(f),
        Some(_) => Err(BookingError::FacilityUnavailable(format!(
            "{facility_id} is disabled"
        ))),
        None => Err(BookingError::FacilityUnavailable(format!(
            "{facility_id} does not exist"
        ))),
    }
}

fn slot_price(facility: &Facility, slot: &Slot) -> f64 {
    facility.price_per_hour * slot.duration_minutes() as f64 / 60.0
}
