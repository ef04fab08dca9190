pub mod catalog;
pub mod events;
pub mod facilities;
pub mod lifecycle;
pub mod notify;
pub mod scheduling;
