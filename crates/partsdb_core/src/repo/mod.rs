//! Repository layer: catalog data access over SQLite.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per component.
//! - Isolate SQL details from service orchestration.
//! - Translate store constraint failures into semantic errors.
//!
//! # Invariants
//! - Write paths validate input before any SQL runs.
//! - Foreign-key failures surface as `RepoError::Referential`, never as a
//!   bare store error.
//! - Lookups of absent rows return `None`/`false`, not errors.

use crate::db::DbError;
use crate::model::catalog::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod link_repo;
pub mod part_repo;
pub mod report_repo;
pub mod vendor_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all catalog repositories.
#[derive(Debug)]
pub enum RepoError {
    /// Input rejected before reaching the store.
    Validation(ValidationError),
    /// A referenced parent row does not exist.
    Referential {
        operation: &'static str,
        table: &'static str,
        id: i64,
    },
    /// Row already exists under a unique key.
    Conflict(String),
    Db(DbError),
    /// Persisted data cannot be converted into a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Referential {
                operation,
                table,
                id,
            } => write!(f, "{operation}: no row with id {id} in `{table}`"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Referential { .. } | Self::Conflict(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
