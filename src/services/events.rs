use tokio::sync::broadcast;

use crate::models::{Booking, BookingEvent, BookingEventKind};

/// Capacity of the booking event channel. Slow subscribers skip ahead.
pub const CHANNEL_CAPACITY: usize = 256;

pub fn channel() -> broadcast::Sender<BookingEvent> {
    broadcast::channel(CHANNEL_CAPACITY).0
}

pub fn publish(tx: &broadcast::Sender<BookingEvent>, kind: BookingEventKind, booking: &Booking) {
    // No subscribers is fine.
    let _ = tx.send(BookingEvent::from_booking(kind, booking));
}
