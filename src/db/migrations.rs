use anyhow::Context;
use rusqlite::Connection;

/// Ordered by name; each runs once and is recorded in `_migrations`.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "0001_facilities.sql",
        "CREATE TABLE facilities (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            facility_type TEXT NOT NULL CHECK (facility_type IN ('ground', 'net')),
            price_per_hour REAL NOT NULL CHECK (price_per_hour >= 0),
            is_available INTEGER NOT NULL DEFAULT 1,
            description TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX idx_facilities_type ON facilities (facility_type);",
    ),
    (
        "0002_bookings.sql",
        "CREATE TABLE bookings (
            id TEXT PRIMARY KEY,
            facility_id TEXT NOT NULL,
            facility_type TEXT NOT NULL,
            facility_name TEXT NOT NULL,
            booking_date TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            price REAL NOT NULL,
            customer_name TEXT NOT NULL,
            customer_email TEXT NOT NULL,
            customer_phone TEXT NOT NULL,
            user_id INTEGER,
            match_type TEXT,
            match_overs INTEGER,
            status TEXT NOT NULL,
            payment_id TEXT,
            refund_amount REAL NOT NULL DEFAULT 0,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX idx_bookings_slot
            ON bookings (facility_id, booking_date, start_time, end_time, status);
        CREATE INDEX idx_bookings_email ON bookings (customer_email);",
    ),
];

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;

        if already_applied {
            continue;
        }

        let tx = conn
            .unchecked_transaction()
            .with_context(|| format!("failed to begin migration: {name}"))?;
        tx.execute_batch(sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;
        tx.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
            .with_context(|| format!("failed to record migration: {name}"))?;
        tx.commit()
            .with_context(|| format!("failed to commit migration: {name}"))?;

        tracing::info!("applied migration: {name}");
    }

    Ok(())
}
