use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::facility::FacilityType;
use super::slot::Slot;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub facility_id: String,
    pub facility_type: FacilityType,
    pub facility_name: String,
    pub booking_date: NaiveDate,
    #[serde(flatten)]
    pub slot: Slot,
    pub price: f64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub user_id: Option<i64>,
    pub match_type: Option<String>,
    pub match_overs: Option<i32>,
    pub status: BookingStatus,
    pub payment_id: Option<String>,
    pub refund_amount: f64,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.booking_date.and_time(self.slot.start_time)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Failed,
    Refunded,
}

impl BookingStatus {
    /// Statuses that hold a slot for conflict checking.
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Failed => "FAILED",
            BookingStatus::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Some(BookingStatus::Pending),
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "COMPLETED" => Some(BookingStatus::Completed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            "FAILED" => Some(BookingStatus::Failed),
            "REFUNDED" => Some(BookingStatus::Refunded),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    /// Transitions allowed outside of administrative override.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Completed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Pending, Failed)
                | (Confirmed, Failed)
                | (Failed, Refunded)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl CustomerInfo {
    /// Checks the three fields and returns them trimmed.
    pub fn validated(&self) -> Result<CustomerInfo, String> {
        let name = self.name.trim();
        let email = self.email.trim();
        let phone = self.phone.trim();

        if name.is_empty() {
            return Err("customer name is required".to_string());
        }
        if !is_valid_email(email) {
            return Err(format!("invalid email address: {email}"));
        }
        if !is_valid_phone(phone) {
            return Err(format!("invalid phone number: {phone}"));
        }

        Ok(CustomerInfo {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
        })
    }
}

pub fn is_valid_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !s.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .map(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
            .unwrap_or(false)
}

/// 10 to 15 digits, optional leading `+`, spaces and dashes allowed as
/// separators.
pub fn is_valid_phone(s: &str) -> bool {
    let body = s.strip_prefix('+').unwrap_or(s);
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-') {
        return false;
    }
    let digits = body.chars().filter(|c| c.is_ascii_digit()).count();
    (10..=15).contains(&digits)
}

/// Customer-facing booking request, already resolved to 24-hour times.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub facility_id: String,
    pub booking_date: NaiveDate,
    pub slot: Slot,
    pub customer: CustomerInfo,
    pub price: Option<f64>,
    pub user_id: Option<i64>,
    pub match_type: Option<String>,
    pub match_overs: Option<i32>,
}

/// Fields an administrator may overwrite. `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct BookingChanges {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub booking_date: Option<NaiveDate>,
    pub slot: Option<Slot>,
    pub price: Option<f64>,
    pub status: Option<BookingStatus>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::Failed,
            BookingStatus::Refunded,
        ] {
            assert_eq!(BookingStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(BookingStatus::parse("confirmed"), Some(BookingStatus::Confirmed));
        assert_eq!(BookingStatus::parse("CANCELLATION_PENDING"), None);
    }

    #[test]
    fn test_only_pending_and_confirmed_are_active() {
        assert!(BookingStatus::Pending.is_active());
        assert!(BookingStatus::Confirmed.is_active());
        assert!(!BookingStatus::Cancelled.is_active());
        assert!(!BookingStatus::Failed.is_active());
        assert!(!BookingStatus::Completed.is_active());
        assert!(!BookingStatus::Refunded.is_active());
    }

    #[test]
    fn test_transitions() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Refunded));

        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Refunded.can_transition_to(Confirmed));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Pending));
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_string(&BookingStatus::Confirmed).unwrap();
        assert_eq!(json, "\"CONFIRMED\"");
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@academy.co.in"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@@x.com"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("ax.com"));
    }

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("9999999999"));
        assert!(is_valid_phone("+91 98765-43210"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("99999abc99"));
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn test_customer_validation_trims() {
        let info = CustomerInfo {
            name: "  A ".to_string(),
            email: " a@x.com".to_string(),
            phone: "9999999999 ".to_string(),
        };
        let clean = info.validated().unwrap();
        assert_eq!(clean.name, "A");
        assert_eq!(clean.email, "a@x.com");
        assert_eq!(clean.phone, "9999999999");
    }

    #[test]
    fn test_customer_validation_rejects_blank_name() {
        let info = CustomerInfo {
            name: "   ".to_string(),
            email: "a@x.com".to_string(),
            phone: "9999999999".to_string(),
        };
        assert!(info.validated().is_err());
    }
}
