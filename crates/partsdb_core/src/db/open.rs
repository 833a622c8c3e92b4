//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by core behavior.
//! - Provide `Store`, the per-operation connection factory.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - `open_db*` return connections with the schema fully applied.
//! - `Store::connect` never applies schema changes; it refuses stale schemas.

use super::migrations::{ensure_schema, ensure_schema_ready};
use super::{DbError, DbResult};
use crate::config::{StoreConfig, StoreLocation};
use log::{debug, error, info};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

static MEMORY_STORE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Opens a SQLite database file and ensures the catalog schema.
///
/// # Side effects
/// - Creates the file when missing.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    open_bootstrapped("file", &path.display().to_string(), || {
        Connection::open(path)
    })
}

/// Opens a private in-memory SQLite database and ensures the catalog schema.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_bootstrapped("memory", ":memory:", Connection::open_in_memory)
}

fn open_bootstrapped(
    mode: &str,
    location: &str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = open().map_err(|source| {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={source}",
            started_at.elapsed().as_millis()
        );
        DbError::StoreUnavailable {
            location: location.to_string(),
            source,
        }
    })?;

    let bootstrapped = configure_connection(&conn, DEFAULT_BUSY_TIMEOUT)
        .and_then(|()| ensure_schema(&mut conn).map(|_| ()));
    match bootstrapped {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}

fn configure_connection(conn: &Connection, busy_timeout: Duration) -> DbResult<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}

/// Per-operation connection factory over one configured store.
///
/// Each call to [`Store::connect`] opens a fresh connection that the caller
/// owns; dropping it releases the underlying handle. In-memory stores are
/// backed by a named shared-cache database that lives as long as the `Store`.
pub struct Store {
    config: StoreConfig,
    target: PathBuf,
    _memory_anchor: Option<Connection>,
}

impl Store {
    /// Prepares a store from validated settings.
    ///
    /// File stores are not touched until the first connection. In-memory
    /// stores open an anchor connection immediately.
    pub fn new(config: StoreConfig) -> DbResult<Self> {
        match &config.location {
            StoreLocation::File(path) => Ok(Self {
                target: path.clone(),
                config,
                _memory_anchor: None,
            }),
            StoreLocation::Memory => {
                let seq = MEMORY_STORE_SEQ.fetch_add(1, Ordering::Relaxed);
                let target = PathBuf::from(format!(
                    "file:partsdb-mem-{}-{seq}?mode=memory&cache=shared",
                    std::process::id()
                ));
                let anchor = open_raw(&target, &config)?;
                Ok(Self {
                    target,
                    config,
                    _memory_anchor: Some(anchor),
                })
            }
        }
    }

    /// Returns the settings this store was built from.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Creates or upgrades the catalog schema. Idempotent.
    ///
    /// Any failure here is fatal for callers: no other operation can run.
    pub fn ensure_schema(&self) -> DbResult<usize> {
        let started_at = Instant::now();
        let mut conn = open_raw(&self.target, &self.config)?;
        match ensure_schema(&mut conn) {
            Ok(applied) => {
                info!(
                    "event=schema_setup module=db status=ok applied={applied} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(applied)
            }
            Err(err) => {
                error!(
                    "event=schema_setup module=db status=error duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    /// Opens one scoped connection for a single operation.
    ///
    /// # Errors
    /// - `StoreUnavailable` when the store cannot be opened.
    /// - `SchemaNotReady` when `ensure_schema` has not completed yet.
    pub fn connect(&self) -> DbResult<Connection> {
        let conn = open_raw(&self.target, &self.config)?;
        ensure_schema_ready(&conn)?;
        debug!("event=db_connect module=db status=ok location={}", self.config.location);
        Ok(conn)
    }
}

fn open_raw(target: &Path, config: &StoreConfig) -> DbResult<Connection> {
    let location = config.location.to_string();
    let conn = Connection::open_with_flags(target, OpenFlags::default()).map_err(|source| {
        error!(
            "event=db_connect module=db status=error error_code=db_open_failed location={location} error={source}"
        );
        DbError::StoreUnavailable {
            location: location.clone(),
            source,
        }
    })?;
    configure_connection(&conn, config.busy_timeout).map_err(|err| match err {
        DbError::Sqlite(source) => DbError::StoreUnavailable { location, source },
        other => other,
    })?;
    Ok(conn)
}
