//! Schema registry and idempotent schema bootstrap.
//!
//! # Responsibility
//! - Register catalog schema steps in strictly increasing order.
//! - Apply pending steps atomically (`ensure_schema`).
//! - Gate ordinary connections on a fully applied schema.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied version is mirrored to `PRAGMA user_version`.
//! - Every step uses `IF NOT EXISTS`, so re-running against tables created
//!   out of band is harmless.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_catalog.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_routines.sql"),
    },
    Migration {
        version: 3,
        sql: include_str!("0003_blank_text_guards.sql"),
    },
];

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Creates every catalog table that does not exist yet.
///
/// Safe to call any number of times. Returns the number of schema steps
/// applied by this call (`0` when the schema was already current).
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the database is newer than this binary.
/// - `Sqlite` when a statement fails; no partial step is committed.
pub fn ensure_schema(conn: &mut Connection) -> DbResult<usize> {
    let current_version = schema_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    let mut applied = 0;
    for migration in MIGRATIONS
        .iter()
        .filter(|migration| migration.version > current_version)
    {
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
        applied += 1;
    }
    tx.commit()?;

    info!(
        "event=schema_ensure module=db status=ok from_version={} to_version={} applied={}",
        current_version, latest, applied
    );
    Ok(applied)
}

/// Fails unless the connection's schema is exactly the latest version.
pub fn ensure_schema_ready(conn: &Connection) -> DbResult<()> {
    let actual = schema_version(conn)?;
    let expected = latest_version();
    if actual > expected {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: actual,
            latest_supported: expected,
        });
    }
    if actual != expected {
        return Err(DbError::SchemaNotReady { expected, actual });
    }
    Ok(())
}

/// Reads `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
