use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::booking::{Booking, BookingStatus};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BookingEvent {
    pub kind: BookingEventKind,
    pub booking_id: String,
    pub facility_id: String,
    pub booking_date: NaiveDate,
    pub status: BookingStatus,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingEventKind {
    Created,
    StatusChanged,
    Updated,
    Deleted,
}

impl BookingEvent {
    pub fn from_booking(kind: BookingEventKind, booking: &Booking) -> Self {
        Self {
            kind,
            booking_id: booking.id.clone(),
            facility_id: booking.facility_id.clone(),
            booking_date: booking.booking_date,
            status: booking.status,
        }
    }
}
