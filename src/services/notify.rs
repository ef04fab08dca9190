use async_trait::async_trait;

use crate::models::Booking;

/// Receives confirmed bookings. Delivery (email, SMS) lives behind this seam.
#[async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn booking_confirmed(&self, booking: &Booking) -> anyhow::Result<()>;
}

/// Writes the confirmation to the log instead of delivering it.
pub struct LogNotifier;

#[async_trait]
impl BookingNotifier for LogNotifier {
    async fn booking_confirmed(&self, booking: &Booking) -> anyhow::Result<()> {
        tracing::info!(
            booking_id = %booking.id,
            to = %booking.customer_email,
            facility = %booking.facility_name,
            date = %booking.booking_date,
            slot = %booking.slot.label(),
            "booking confirmation"
        );
        Ok(())
    }
}

/// Hands a confirmed booking to the notifier. Failures are logged and
/// swallowed; the booking is already committed.
pub async fn send_confirmation(notifier: &dyn BookingNotifier, booking: &Booking) {
    if let Err(e) = notifier.booking_confirmed(booking).await {
        tracing::error!(error = %e, booking_id = %booking.id, "failed to send booking confirmation");
    }
}
