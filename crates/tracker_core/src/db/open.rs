//! Opening a tracker store.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` (completion records cascade
//!   with their tracker) and a busy timeout.
//! - Returned connections are at the latest schema version.
//! - Every failure names the store it happened on.

use super::migrations::apply_migrations;
use super::{DbError, DbResult, StoreLocation};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) the store file at `path` and upgrades it.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_at(StoreLocation::File(path.as_ref().to_path_buf()))
}

/// Opens a throwaway in-memory store at the latest schema.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_at(StoreLocation::Memory)
}

fn open_at(location: StoreLocation) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = location.mode();
    info!("event=db_open module=db status=start mode={mode}");

    let result = connect(&location).and_then(|mut conn| {
        configure(&conn, &location)?;
        apply_migrations(&mut conn).map_err(|err| err.at(&location))?;
        Ok(conn)
    });

    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => info!("event=db_open module=db status=ok mode={mode} duration_ms={duration_ms}"),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={duration_ms} error_code={} error={err}",
            error_code(err)
        ),
    }
    result
}

fn connect(location: &StoreLocation) -> DbResult<Connection> {
    let opened = match location {
        StoreLocation::File(path) => Connection::open(path),
        StoreLocation::Memory => Connection::open_in_memory(),
    };
    opened.map_err(|source| DbError::Open {
        location: location.clone(),
        source,
    })
}

fn configure(conn: &Connection, location: &StoreLocation) -> DbResult<()> {
    conn.pragma_update(None, "foreign_keys", true)
        .and_then(|()| conn.busy_timeout(BUSY_TIMEOUT))
        .map_err(|source| DbError::Configure {
            location: location.clone(),
            source,
        })
}

fn error_code(err: &DbError) -> &'static str {
    match err {
        DbError::Open { .. } => "db_open_failed",
        DbError::Configure { .. } => "db_configure_failed",
        DbError::Migration { .. } => "db_migration_failed",
        DbError::SchemaTooNew { .. } => "db_schema_too_new",
        DbError::Sqlite(_) => "db_bootstrap_failed",
    }
}
