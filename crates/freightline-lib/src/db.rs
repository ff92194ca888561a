//! SQLite-backed store for shipments, routes, and legs.
//!
//! A single connection sits behind a mutex. Writes run inside
//! `BEGIN IMMEDIATE` transactions, so two callers racing to finish the last
//! leg of a route are serialised and the second one sees the first's result.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::debug;

use crate::error::Result;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS shipments (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    tracking_code       TEXT NOT NULL UNIQUE,
    container_id        INTEGER NOT NULL,
    customer_id         INTEGER NOT NULL,
    origin_address      TEXT NOT NULL,
    origin_lat          REAL,
    origin_lon          REAL,
    destination_address TEXT NOT NULL,
    destination_lat     REAL,
    destination_lon     REAL,
    state               TEXT NOT NULL,
    estimated_cost      REAL,
    estimated_hours     REAL,
    final_cost          REAL,
    final_hours         REAL,
    created_at          TEXT NOT NULL,
    scheduled_at        TEXT,
    delivered_at        TEXT
);

CREATE INDEX IF NOT EXISTS idx_shipments_container ON shipments(container_id);
CREATE INDEX IF NOT EXISTS idx_shipments_customer ON shipments(customer_id);

CREATE TABLE IF NOT EXISTS routes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    shipment_id INTEGER NOT NULL REFERENCES shipments(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_routes_shipment ON routes(shipment_id);

CREATE TABLE IF NOT EXISTS legs (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    route_id      INTEGER NOT NULL REFERENCES routes(id) ON DELETE CASCADE,
    sequence      INTEGER NOT NULL,
    truck_id      TEXT,
    origin        TEXT NOT NULL,
    destination   TEXT NOT NULL,
    distance_km   REAL NOT NULL,
    state         TEXT NOT NULL,
    planned_start TEXT,
    planned_end   TEXT,
    actual_start  TEXT,
    actual_end    TEXT,
    real_cost     REAL
);

CREATE INDEX IF NOT EXISTS idx_legs_route ON legs(route_id);
"#;

/// Shared handle to the persistent store.
#[derive(Debug)]
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (creating if needed) the database at `path`. `:memory:` is accepted.
    pub fn open(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "opening store");
        let conn = if path.as_os_str() == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-transaction rolls back on drop, so the connection is still usable.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run read-only work against the connection.
    pub fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock();
        f(&conn)
    }

    /// Run `f` inside an immediate transaction, committing only on success.
    pub fn write<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Cheap liveness probe used by readiness checks.
    pub fn ping(&self) -> Result<()> {
        self.read(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }
}
