//! Tracker store: connection bootstrap and schema upgrades.
//!
//! # Responsibility
//! - Say where a store lives (`StoreLocation`) and report failures against it.
//! - Keep the schema at the version the repositories are written for.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A store that reports a newer version than this build is never touched.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Where a tracker store is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

impl StoreLocation {
    /// Short tag used in log events.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

impl Display for StoreLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory => write!(f, ":memory:"),
        }
    }
}

/// Failure while opening, upgrading or reading the tracker store.
#[derive(Debug)]
pub enum DbError {
    /// SQLite could not open the store at all.
    Open {
        location: StoreLocation,
        source: rusqlite::Error,
    },
    /// Connection pragmas could not be applied.
    Configure {
        location: StoreLocation,
        source: rusqlite::Error,
    },
    /// One upgrade step failed; the whole upgrade was rolled back.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// The store was written by a newer build. `location` is unknown when
    /// migrations run on a caller-provided connection.
    SchemaTooNew {
        location: Option<StoreLocation>,
        found: u32,
        supported: u32,
    },
    /// Statement failure after the store is open.
    Sqlite(rusqlite::Error),
}

impl DbError {
    /// Attaches `location` to errors raised before it was known.
    pub(crate) fn at(self, location: &StoreLocation) -> Self {
        match self {
            Self::SchemaTooNew {
                found, supported, ..
            } => Self::SchemaTooNew {
                location: Some(location.clone()),
                found,
                supported,
            },
            other => other,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { location, source } => {
                write!(f, "cannot open tracker store {location}: {source}")
            }
            Self::Configure { location, source } => {
                write!(f, "cannot configure tracker store {location}: {source}")
            }
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "schema upgrade {version} ({name}) failed: {source}"),
            Self::SchemaTooNew {
                location,
                found,
                supported,
            } => {
                write!(f, "tracker store")?;
                if let Some(location) = location {
                    write!(f, " {location}")?;
                }
                write!(
                    f,
                    " has schema version {found}; this build supports up to {supported}"
                )
            }
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. }
            | Self::Configure { source, .. }
            | Self::Migration { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
