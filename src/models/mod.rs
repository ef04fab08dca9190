pub mod booking;
pub mod event;
pub mod facility;
pub mod slot;

pub use booking::{Booking, BookingChanges, BookingStatus, CustomerInfo, NewBooking};
pub use event::{BookingEvent, BookingEventKind};
pub use facility::{Facility, FacilityType};
pub use slot::{Slot, SlotParseError};
