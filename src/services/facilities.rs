use rusqlite::Connection;

use crate::db::queries;
use crate::errors::BookingError;
use crate::models::{Facility, FacilityType};

#[derive(Debug, Clone)]
pub struct NewFacility {
    pub name: String,
    pub facility_type: FacilityType,
    pub price_per_hour: f64,
    pub description: Option<String>,
    pub is_available: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FacilityChanges {
    pub name: Option<String>,
    pub price_per_hour: Option<f64>,
    pub description: Option<String>,
    pub is_available: Option<bool>,
}

fn check_name(name: &str) -> Result<String, BookingError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BookingError::Validation("facility name is required".to_string()));
    }
    Ok(name.to_string())
}

fn check_price(price: f64) -> Result<f64, BookingError> {
    if !price.is_finite() || price < 0.0 {
        return Err(BookingError::Validation(format!("invalid price per hour: {price}")));
    }
    Ok(price)
}

pub fn create_facility(conn: &Connection, new: NewFacility) -> Result<Facility, BookingError> {
    let now = queries::now_ts();
    let facility = Facility {
        id: uuid::Uuid::new_v4().to_string(),
        name: check_name(&new.name)?,
        facility_type: new.facility_type,
        price_per_hour: check_price(new.price_per_hour)?,
        is_available: new.is_available,
        description: new.description.filter(|d| !d.trim().is_empty()),
        created_at: now,
        updated_at: now,
    };
    queries::insert_facility(conn, &facility)?;
    tracing::info!(facility_id = %facility.id, name = %facility.name, "facility created");
    Ok(facility)
}

pub fn get_facility(conn: &Connection, id: &str) -> Result<Facility, BookingError> {
    queries::get_facility(conn, id)?.ok_or_else(|| BookingError::NotFound(format!("facility {id}")))
}

pub fn update_facility(
    conn: &Connection,
    id: &str,
    changes: FacilityChanges,
) -> Result<Facility, BookingError> {
    let mut facility = get_facility(conn, id)?;

    if let Some(name) = changes.name {
        facility.name = check_name(&name)?;
    }
    if let Some(price) = changes.price_per_hour {
        facility.price_per_hour = check_price(price)?;
    }
    if let Some(description) = changes.description {
        facility.description = Some(description).filter(|d| !d.trim().is_empty());
    }
    if let Some(is_available) = changes.is_available {
        facility.is_available = is_available;
    }

    if !queries::update_facility(conn, &facility)? {
        return Err(BookingError::NotFound(format!("facility {id}")));
    }
    get_facility(conn, id)
}

/// Opens or closes a facility for new bookings. Existing bookings are kept.
pub fn set_availability(conn: &Connection, id: &str, is_available: bool) -> Result<Facility, BookingError> {
    if !queries::set_facility_availability(conn, id, is_available)? {
        return Err(BookingError::NotFound(format!("facility {id}")));
    }
    tracing::info!(facility_id = %id, is_available, "facility availability changed");
    get_facility(conn, id)
}

pub fn delete_facility(conn: &Connection, id: &str) -> Result<(), BookingError> {
    if !queries::delete_facility(conn, id)? {
        return Err(BookingError::NotFound(format!("facility {id}")));
    }
    tracing::info!(facility_id = %id, "facility deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn net(name: &str) -> NewFacility {
        NewFacility {
            name: name.to_string(),
            facility_type: FacilityType::Net,
            price_per_hour: 200.0,
            description: Some("Turf net".to_string()),
            is_available: true,
        }
    }

    #[test]
    fn test_create_and_update() {
        let conn = db::init_db(":memory:").unwrap();
        let f = create_facility(&conn, net("  Net 1 ")).unwrap();
        assert_eq!(f.name, "Net 1");

        let updated = update_facility(
            &conn,
            &f.id,
            FacilityChanges {
                price_per_hour: Some(250.0),
                description: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.price_per_hour, 250.0);
        assert_eq!(updated.description, None);
        assert_eq!(updated.name, "Net 1");
    }

    #[test]
    fn test_rejects_bad_input() {
        let conn = db::init_db(":memory:").unwrap();
        assert!(matches!(create_facility(&conn, net(" ")), Err(BookingError::Validation(_))));

        let mut free = net("Net 2");
        free.price_per_hour = -5.0;
        assert!(matches!(create_facility(&conn, free), Err(BookingError::Validation(_))));
    }

    #[test]
    fn test_availability_and_delete() {
        let conn = db::init_db(":memory:").unwrap();
        let f = create_facility(&conn, net("Net 1")).unwrap();

        assert!(!set_availability(&conn, &f.id, false).unwrap().is_available);
        delete_facility(&conn, &f.id).unwrap();
        assert!(matches!(get_facility(&conn, &f.id), Err(BookingError::NotFound(_))));
        assert!(matches!(delete_facility(&conn, &f.id), Err(BookingError::NotFound(_))));
    }
}
