//! SQLite storage bootstrap, schema management and scoped connections.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the parts catalog.
//! - Apply the catalog schema in deterministic order.
//! - Hand out one short-lived connection per operation through `Store`.
//!
//! # Invariants
//! - Every connection has `foreign_keys=ON` and a bounded busy timeout.
//! - Core code must not read/write catalog data before the schema is current.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod introspect;
pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, Store};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The store could not be opened or configured at all.
    StoreUnavailable {
        location: String,
        source: rusqlite::Error,
    },
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    SchemaNotReady {
        expected: u32,
        actual: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::StoreUnavailable { location, source } => {
                write!(f, "store unavailable at `{location}`: {source}")
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::SchemaNotReady { expected, actual } => write!(
                f,
                "database schema version {actual} is not current (expected {expected}); run schema setup first"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::StoreUnavailable { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. } | Self::SchemaNotReady { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
