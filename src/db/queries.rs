use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

use crate::models::slot::{format_hhmm, parse_hhmm};
use crate::models::{Booking, BookingStatus, Facility, FacilityType, Slot};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn now_ts() -> NaiveDateTime {
    // Second precision, matching what is stored.
    let now = Utc::now().naive_utc();
    NaiveDateTime::parse_from_str(&now.format(TS_FORMAT).to_string(), TS_FORMAT).unwrap_or(now)
}

fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn fmt_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn get_ts(row: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TS_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn get_date(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn get_slot(row: &Row, start_idx: usize, end_idx: usize) -> rusqlite::Result<Slot> {
    let start: String = row.get(start_idx)?;
    let end: String = row.get(end_idx)?;
    let start = parse_hhmm(&start).map_err(|e| conversion_error(start_idx, e))?;
    let end = parse_hhmm(&end).map_err(|e| conversion_error(end_idx, e))?;
    // Administrative edits are not re-validated, so read the pair back as is.
    Ok(Slot {
        start_time: start,
        end_time: end,
    })
}

#[derive(Debug, thiserror::Error)]
#[error("unknown {what}: {value}")]
struct UnknownValue {
    what: &'static str,
    value: String,
}

fn get_facility_type(row: &Row, idx: usize) -> rusqlite::Result<FacilityType> {
    let raw: String = row.get(idx)?;
    FacilityType::parse(&raw).ok_or_else(|| {
        conversion_error(
            idx,
            UnknownValue {
                what: "facility type",
                value: raw,
            },
        )
    })
}

fn get_status(row: &Row, idx: usize) -> rusqlite::Result<BookingStatus> {
    let raw: String = row.get(idx)?;
    BookingStatus::parse(&raw).ok_or_else(|| {
        conversion_error(
            idx,
            UnknownValue {
                what: "booking status",
                value: raw,
            },
        )
    })
}

// ── Facilities ──

const FACILITY_COLUMNS: &str =
    "id, name, facility_type, price_per_hour, is_available, description, created_at, updated_at";

fn parse_facility_row(row: &Row) -> rusqlite::Result<Facility> {
    Ok(Facility {
        id: row.get(0)?,
        name: row.get(1)?,
        facility_type: get_facility_type(row, 2)?,
        price_per_hour: row.get(3)?,
        is_available: row.get::<_, i32>(4)? != 0,
        description: row.get(5)?,
        created_at: get_ts(row, 6)?,
        updated_at: get_ts(row, 7)?,
    })
}

pub fn insert_facility(conn: &Connection, facility: &Facility) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO facilities (id, name, facility_type, price_per_hour, is_available, description, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            facility.id,
            facility.name,
            facility.facility_type.as_str(),
            facility.price_per_hour,
            facility.is_available as i32,
            facility.description,
            fmt_ts(&facility.created_at),
            fmt_ts(&facility.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_facility(conn: &Connection, id: &str) -> rusqlite::Result<Option<Facility>> {
    conn.query_row(
        &format!("SELECT {FACILITY_COLUMNS} FROM facilities WHERE id = ?1"),
        params![id],
        parse_facility_row,
    )
    .optional()
}

pub fn list_facilities(
    conn: &Connection,
    facility_type: Option<FacilityType>,
) -> rusqlite::Result<Vec<Facility>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FACILITY_COLUMNS} FROM facilities
         WHERE (?1 IS NULL OR facility_type = ?1)
         ORDER BY facility_type ASC, name ASC"
    ))?;
    let rows = stmt.query_map(
        params![facility_type.map(|t| t.as_str())],
        parse_facility_row,
    )?;
    rows.collect()
}

pub fn update_facility(conn: &Connection, facility: &Facility) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE facilities SET name = ?1, price_per_hour = ?2, description = ?3, is_available = ?4, updated_at = ?5
         WHERE id = ?6",
        params![
            facility.name,
            facility.price_per_hour,
            facility.description,
            facility.is_available as i32,
            fmt_ts(&now_ts()),
            facility.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn set_facility_availability(
    conn: &Connection,
    id: &str,
    is_available: bool,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE facilities SET is_available = ?1, updated_at = ?2 WHERE id = ?3",
        params![is_available as i32, fmt_ts(&now_ts()), id],
    )?;
    Ok(count > 0)
}

pub fn delete_facility(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let count = conn.execute("DELETE FROM facilities WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, facility_id, facility_type, facility_name, booking_date, start_time, end_time, price, \
     customer_name, customer_email, customer_phone, user_id, match_type, match_overs, status, payment_id, \
     refund_amount, notes, created_at, updated_at";

fn parse_booking_row(row: &Row) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: row.get(0)?,
        facility_id: row.get(1)?,
        facility_type: get_facility_type(row, 2)?,
        facility_name: row.get(3)?,
        booking_date: get_date(row, 4)?,
        slot: get_slot(row, 5, 6)?,
        price: row.get(7)?,
        customer_name: row.get(8)?,
        customer_email: row.get(9)?,
        customer_phone: row.get(10)?,
        user_id: row.get(11)?,
        match_type: row.get(12)?,
        match_overs: row.get(13)?,
        status: get_status(row, 14)?,
        payment_id: row.get(15)?,
        refund_amount: row.get(16)?,
        notes: row.get(17)?,
        created_at: get_ts(row, 18)?,
        updated_at: get_ts(row, 19)?,
    })
}

/// Plain insert with no conflict check. Customer bookings go through
/// [`insert_booking_if_slot_free`].
pub fn insert_booking(conn: &Connection, booking: &Booking) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)"
        ),
        params![
            booking.id,
            booking.facility_id,
            booking.facility_type.as_str(),
            booking.facility_name,
            fmt_date(&booking.booking_date),
            format_hhmm(&booking.slot.start_time),
            format_hhmm(&booking.slot.end_time),
            booking.price,
            booking.customer_name,
            booking.customer_email,
            booking.customer_phone,
            booking.user_id,
            booking.match_type,
            booking.match_overs,
            booking.status.as_str(),
            booking.payment_id,
            booking.refund_amount,
            booking.notes,
            fmt_ts(&booking.created_at),
            fmt_ts(&booking.updated_at),
        ],
    )?;
    Ok(())
}

/// Inserts `booking` unless an active booking already holds the same
/// facility, date and slot. The check and the insert share one
/// `BEGIN IMMEDIATE` transaction, so the database write lock is held across
/// both and concurrent writers (any connection, any process) queue behind it.
///
/// Returns `false` when the slot was already taken.
pub fn insert_booking_if_slot_free(conn: &Connection, booking: &Booking) -> rusqlite::Result<bool> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    if slot_is_held(
        &tx,
        &booking.facility_id,
        &booking.booking_date,
        &booking.slot,
        None,
    )? {
        // Dropping the transaction rolls it back.
        return Ok(false);
    }

    insert_booking(&tx, booking)?;
    tx.commit()?;
    Ok(true)
}

/// Whether an active booking other than `exclude_id` holds the slot.
pub fn slot_is_held(
    conn: &Connection,
    facility_id: &str,
    date: &NaiveDate,
    slot: &Slot,
    exclude_id: Option<&str>,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS (
            SELECT 1 FROM bookings
            WHERE facility_id = ?1 AND booking_date = ?2 AND start_time = ?3 AND end_time = ?4
              AND status IN ('PENDING', 'CONFIRMED')
              AND (?5 IS NULL OR id != ?5)
         )",
        params![
            facility_id,
            fmt_date(date),
            format_hhmm(&slot.start_time),
            format_hhmm(&slot.end_time),
            exclude_id,
        ],
        |row| row.get(0),
    )
}

/// Slots held by `PENDING` or `CONFIRMED` bookings for one facility and day.
pub fn get_held_slots(
    conn: &Connection,
    facility_id: &str,
    date: &NaiveDate,
) -> rusqlite::Result<Vec<Slot>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT start_time, end_time FROM bookings
         WHERE facility_id = ?1 AND booking_date = ?2 AND status IN ('PENDING', 'CONFIRMED')
         ORDER BY start_time ASC",
    )?;
    let rows = stmt.query_map(params![facility_id, fmt_date(date)], |row| {
        get_slot(row, 0, 1)
    })?;
    rows.collect()
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        parse_booking_row,
    )
    .optional()
}

/// Overwrites every mutable column of an existing booking.
pub fn update_booking(conn: &Connection, booking: &Booking) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET
            booking_date = ?1, start_time = ?2, end_time = ?3, price = ?4,
            customer_name = ?5, customer_email = ?6, customer_phone = ?7,
            status = ?8, payment_id = ?9, refund_amount = ?10, notes = ?11, updated_at = ?12
         WHERE id = ?13",
        params![
            fmt_date(&booking.booking_date),
            format_hhmm(&booking.slot.start_time),
            format_hhmm(&booking.slot.end_time),
            booking.price,
            booking.customer_name,
            booking.customer_email,
            booking.customer_phone,
            booking.status.as_str(),
            booking.payment_id,
            booking.refund_amount,
            booking.notes,
            fmt_ts(&booking.updated_at),
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

/// Columns written together with a status change.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusUpdate<'a> {
    /// Replaces the payment id when set.
    pub payment_id: Option<&'a str>,
    /// Appended to the notes on its own line.
    pub note: Option<&'a str>,
    pub refund_amount: Option<f64>,
}

/// Compare-and-set on status: only moves the booking if it is still in
/// `from`, writing the extra columns in the same statement. Returns `false`
/// when someone else changed it first.
pub fn transition_booking_status(
    conn: &Connection,
    id: &str,
    from: BookingStatus,
    to: BookingStatus,
    update: &StatusUpdate,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET
            status = ?1,
            payment_id = COALESCE(?2, payment_id),
            notes = CASE
                WHEN ?3 IS NULL THEN notes
                WHEN notes IS NULL OR notes = '' THEN ?3
                ELSE notes || char(10) || ?3
            END,
            refund_amount = COALESCE(?4, refund_amount),
            updated_at = ?5
         WHERE id = ?6 AND status = ?7",
        params![
            to.as_str(),
            update.payment_id,
            update.note,
            update.refund_amount,
            fmt_ts(&now_ts()),
            id,
            from.as_str(),
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn get_all_bookings(
    conn: &Connection,
    status_filter: Option<BookingStatus>,
    limit: i64,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE (?1 IS NULL OR status = ?1)
         ORDER BY booking_date DESC, start_time DESC LIMIT ?2"
    ))?;
    let rows = stmt.query_map(
        params![status_filter.map(|s| s.as_str()), limit],
        parse_booking_row,
    )?;
    rows.collect()
}

pub fn get_bookings_for_email(conn: &Connection, email: &str) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE customer_email = ?1 COLLATE NOCASE
         ORDER BY created_at DESC, id DESC"
    ))?;
    let rows = stmt.query_map(params![email.trim()], parse_booking_row)?;
    rows.collect()
}

pub fn get_bookings_for_user(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC"
    ))?;
    let rows = stmt.query_map(params![user_id], parse_booking_row)?;
    rows.collect()
}

pub fn get_bookings_for_date_and_type(
    conn: &Connection,
    date: &NaiveDate,
    facility_type: FacilityType,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE booking_date = ?1 AND facility_type = ?2
         ORDER BY start_time ASC, facility_name ASC"
    ))?;
    let rows = stmt.query_map(
        params![fmt_date(date), facility_type.as_str()],
        parse_booking_row,
    )?;
    rows.collect()
}

/// Moves every `CONFIRMED` booking whose slot ended at or before `now` to
/// `COMPLETED` and returns the affected ids.
pub fn complete_elapsed_bookings(
    conn: &Connection,
    now: &NaiveDateTime,
) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "UPDATE bookings SET status = 'COMPLETED', updated_at = ?1
         WHERE status = 'CONFIRMED' AND (booking_date || ' ' || end_time) <= ?2
         RETURNING id",
    )?;
    let rows = stmt.query_map(
        params![fmt_ts(&now_ts()), now.format("%Y-%m-%d %H:%M").to_string()],
        |row| row.get(0),
    )?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn facility(id: &str) -> Facility {
        let now = now_ts();
        Facility {
            id: id.to_string(),
            name: format!("Ground {id}"),
            facility_type: FacilityType::Ground,
            price_per_hour: 500.0,
            is_available: true,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn booking(id: &str, slot: &str, status: BookingStatus) -> Booking {
        let (start, end) = slot.split_once('-').unwrap();
        let now = now_ts();
        Booking {
            id: id.to_string(),
            facility_id: "g1".to_string(),
            facility_type: FacilityType::Ground,
            facility_name: "Ground g1".to_string(),
            booking_date: date("2025-06-01"),
            slot: Slot::from_hhmm(start, end).unwrap(),
            price: 500.0,
            customer_name: "A".to_string(),
            customer_email: "a@x.com".to_string(),
            customer_phone: "9999999999".to_string(),
            user_id: None,
            match_type: None,
            match_overs: None,
            status,
            payment_id: None,
            refund_amount: 0.0,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_facility_round_trip() {
        let conn = setup_db();
        insert_facility(&conn, &facility("g1")).unwrap();

        let loaded = get_facility(&conn, "g1").unwrap().unwrap();
        assert_eq!(loaded.name, "Ground g1");
        assert_eq!(loaded.facility_type, FacilityType::Ground);
        assert!(loaded.is_available);

        assert!(set_facility_availability(&conn, "g1", false).unwrap());
        assert!(!get_facility(&conn, "g1").unwrap().unwrap().is_available);
        assert!(get_facility(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_list_facilities_by_type() {
        let conn = setup_db();
        insert_facility(&conn, &facility("g1")).unwrap();
        let mut net = facility("n1");
        net.facility_type = FacilityType::Net;
        insert_facility(&conn, &net).unwrap();

        assert_eq!(list_facilities(&conn, None).unwrap().len(), 2);
        let nets = list_facilities(&conn, Some(FacilityType::Net)).unwrap();
        assert_eq!(nets.len(), 1);
        assert_eq!(nets[0].id, "n1");
    }

    #[test]
    fn test_booking_round_trip() {
        let conn = setup_db();
        let b = booking("b1", "09:00-10:00", BookingStatus::Pending);
        insert_booking(&conn, &b).unwrap();

        let loaded = get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(loaded.slot, b.slot);
        assert_eq!(loaded.booking_date, b.booking_date);
        assert_eq!(loaded.status, BookingStatus::Pending);
        assert_eq!(loaded.created_at, b.created_at);
    }

    #[test]
    fn test_held_slots_ignore_inactive_bookings() {
        let conn = setup_db();
        insert_booking(&conn, &booking("b1", "09:00-10:00", BookingStatus::Pending)).unwrap();
        insert_booking(&conn, &booking("b2", "10:00-11:00", BookingStatus::Confirmed)).unwrap();
        insert_booking(&conn, &booking("b3", "11:00-12:00", BookingStatus::Cancelled)).unwrap();
        insert_booking(&conn, &booking("b4", "12:00-13:00", BookingStatus::Failed)).unwrap();
        insert_booking(&conn, &booking("b5", "13:00-14:00", BookingStatus::Completed)).unwrap();

        let held = get_held_slots(&conn, "g1", &date("2025-06-01")).unwrap();
        let keys: Vec<String> = held.iter().map(|s| s.key()).collect();
        assert_eq!(keys, vec!["09:00-10:00", "10:00-11:00"]);

        assert!(get_held_slots(&conn, "g1", &date("2025-06-02")).unwrap().is_empty());
    }

    #[test]
    fn test_insert_if_free_refuses_held_slot() {
        let conn = setup_db();
        assert!(insert_booking_if_slot_free(&conn, &booking("b1", "09:00-10:00", BookingStatus::Pending)).unwrap());
        assert!(!insert_booking_if_slot_free(&conn, &booking("b2", "09:00-10:00", BookingStatus::Pending)).unwrap());
        assert!(get_booking_by_id(&conn, "b2").unwrap().is_none());

        // A different slot on the same day is independent.
        assert!(insert_booking_if_slot_free(&conn, &booking("b3", "10:00-11:00", BookingStatus::Pending)).unwrap());
    }

    #[test]
    fn test_insert_if_free_after_cancellation() {
        let conn = setup_db();
        insert_booking(&conn, &booking("b1", "09:00-10:00", BookingStatus::Cancelled)).unwrap();
        assert!(insert_booking_if_slot_free(&conn, &booking("b2", "09:00-10:00", BookingStatus::Pending)).unwrap());
    }

    #[test]
    fn test_transition_is_compare_and_set() {
        let conn = setup_db();
        insert_booking(&conn, &booking("b1", "09:00-10:00", BookingStatus::Pending)).unwrap();

        let paid = |payment_id| StatusUpdate {
            payment_id: Some(payment_id),
            ..Default::default()
        };
        assert!(transition_booking_status(&conn, "b1", BookingStatus::Pending, BookingStatus::Confirmed, &paid("pay_1")).unwrap());
        assert!(!transition_booking_status(&conn, "b1", BookingStatus::Pending, BookingStatus::Confirmed, &paid("pay_2")).unwrap());

        let loaded = get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(loaded.status, BookingStatus::Confirmed);
        assert_eq!(loaded.payment_id.as_deref(), Some("pay_1"));
    }

    #[test]
    fn test_complete_elapsed_only_confirmed() {
        let conn = setup_db();
        insert_booking(&conn, &booking("b1", "09:00-10:00", BookingStatus::Confirmed)).unwrap();
        insert_booking(&conn, &booking("b2", "10:00-11:00", BookingStatus::Confirmed)).unwrap();
        insert_booking(&conn, &booking("b3", "08:00-09:00", BookingStatus::Pending)).unwrap();

        let now = date("2025-06-01").and_hms_opt(10, 0, 0).unwrap();
        let done = complete_elapsed_bookings(&conn, &now).unwrap();
        assert_eq!(done, vec!["b1".to_string()]);

        assert_eq!(get_booking_by_id(&conn, "b1").unwrap().unwrap().status, BookingStatus::Completed);
        assert_eq!(get_booking_by_id(&conn, "b2").unwrap().unwrap().status, BookingStatus::Confirmed);
        assert_eq!(get_booking_by_id(&conn, "b3").unwrap().unwrap().status, BookingStatus::Pending);
    }

    #[test]
    fn test_bookings_for_email_case_insensitive() {
        let conn = setup_db();
        insert_booking(&conn, &booking("b1", "09:00-10:00", BookingStatus::Pending)).unwrap();
        let found = get_bookings_for_email(&conn, "A@X.com").unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_transition_writes_note_and_refund_only_on_success() {
        let conn = setup_db();
        insert_booking(&conn, &booking("b1", "09:00-10:00", BookingStatus::Pending)).unwrap();

        let cancel = StatusUpdate {
            note: Some("rain"),
            ..Default::default()
        };
        assert!(transition_booking_status(&conn, "b1", BookingStatus::Pending, BookingStatus::Cancelled, &cancel).unwrap());

        // Stale `from` status: nothing is written.
        let stale = StatusUpdate {
            note: Some("late"),
            refund_amount: Some(10.0),
            ..Default::default()
        };
        assert!(!transition_booking_status(&conn, "b1", BookingStatus::Pending, BookingStatus::Failed, &stale).unwrap());

        let loaded = get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(loaded.status, BookingStatus::Cancelled);
        assert_eq!(loaded.notes.as_deref(), Some("rain"));
        assert_eq!(loaded.refund_amount, 0.0);

        let mut failed = booking("b2", "10:00-11:00", BookingStatus::Failed);
        failed.notes = Some("first".to_string());
        insert_booking(&conn, &failed).unwrap();
        let refund = StatusUpdate {
            note: Some("second"),
            refund_amount: Some(250.0),
            ..Default::default()
        };
        assert!(transition_booking_status(&conn, "b2", BookingStatus::Failed, BookingStatus::Refunded, &refund).unwrap());
        let loaded = get_booking_by_id(&conn, "b2").unwrap().unwrap();
        assert_eq!(loaded.notes.as_deref(), Some("first\nsecond"));
        assert_eq!(loaded.refund_amount, 250.0);
    }

    #[test]
    fn test_bookings_for_user_newest_first() {
        let conn = setup_db();
        let mut older = booking("b1", "09:00-10:00", BookingStatus::Pending);
        older.user_id = Some(7);
        older.created_at = NaiveDateTime::parse_from_str("2025-05-01 08:00:00", TS_FORMAT).unwrap();
        let mut newer = booking("b2", "10:00-11:00", BookingStatus::Confirmed);
        newer.user_id = Some(7);
        newer.created_at = NaiveDateTime::parse_from_str("2025-05-02 08:00:00", TS_FORMAT).unwrap();
        let mut other = booking("b3", "11:00-12:00", BookingStatus::Pending);
        other.user_id = Some(8);
        insert_booking(&conn, &older).unwrap();
        insert_booking(&conn, &newer).unwrap();
        insert_booking(&conn, &other).unwrap();
        insert_booking(&conn, &booking("b4", "12:00-13:00", BookingStatus::Pending)).unwrap();

        let ids: Vec<String> = get_bookings_for_user(&conn, 7)
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec!["b2", "b1"]);
        assert!(get_bookings_for_user(&conn, 99).unwrap().is_empty());
    }
}
