//! Routine catalog persistence.
//!
//! # Responsibility
//! - Store, replace, look up and drop routine definitions.
//! - Compile definitions against the live schema before storing them.
//!
//! # Invariants
//! - `register_routine` is idempotent: same name replaces the definition.
//! - Function bodies are exactly one row-returning statement.
//! - Procedure statements never return rows.
//! - Every parameter is named; positional `?` parameters are rejected.

use super::{validate_routine_name, RoutineDefinition, RoutineError, RoutineKind, RoutineResult};
use log::info;
use rusqlite::{params, Batch, Connection, OptionalExtension, Row};

/// Repository interface for the routine catalog.
pub trait RoutineRegistry {
    /// Creates or replaces a routine definition.
    fn register_routine(&self, definition: &RoutineDefinition) -> RoutineResult<()>;
    /// Loads one routine by name.
    fn get_routine(&self, name: &str) -> RoutineResult<Option<RoutineDefinition>>;
    /// Lists routines by name.
    fn list_routines(&self) -> RoutineResult<Vec<RoutineDefinition>>;
    /// Removes one routine. Returns whether a row went away.
    fn drop_routine(&self, name: &str) -> RoutineResult<bool>;
}

/// SQLite-backed routine catalog.
pub struct SqliteRoutineRegistry<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRoutineRegistry<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RoutineRegistry for SqliteRoutineRegistry<'_> {
    fn register_routine(&self, definition: &RoutineDefinition) -> RoutineResult<()> {
        validate_routine_name(&definition.name)?;
        let statements = compile_definition(self.conn, definition)?;

        self.conn.execute(
            "INSERT INTO routines (routine_name, routine_kind, routine_body)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (routine_name) DO UPDATE SET
                routine_kind = excluded.routine_kind,
                routine_body = excluded.routine_body,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                definition.name.as_str(),
                definition.kind.as_str(),
                definition.body.as_str(),
            ],
        )?;

        info!(
            "event=routine_register module=routine status=ok name={} kind={} statements={statements}",
            definition.name, definition.kind
        );
        Ok(())
    }

    fn get_routine(&self, name: &str) -> RoutineResult<Option<RoutineDefinition>> {
        let row = self
            .conn
            .query_row(
                "SELECT routine_name, routine_kind, routine_body
                 FROM routines
                 WHERE routine_name = ?1;",
                [name],
                read_raw_routine,
            )
            .optional()?;
        row.map(parse_routine).transpose()
    }

    fn list_routines(&self) -> RoutineResult<Vec<RoutineDefinition>> {
        let mut stmt = self.conn.prepare(
            "SELECT routine_name, routine_kind, routine_body
             FROM routines
             ORDER BY routine_name ASC;",
        )?;
        let rows = stmt
            .query_map([], read_raw_routine)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(parse_routine).collect()
    }

    fn drop_routine(&self, name: &str) -> RoutineResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM routines WHERE routine_name = ?1;", [name])?;
        Ok(changed > 0)
    }
}

/// Prepares every statement of a definition and checks its shape.
///
/// Returns the statement count.
fn compile_definition(conn: &Connection, definition: &RoutineDefinition) -> RoutineResult<usize> {
    let invalid = |message: String| RoutineError::InvalidDefinition {
        name: definition.name.clone(),
        message,
    };

    let mut batch = Batch::new(conn, &definition.body);
    let mut count = 0;
    loop {
        let stmt = match batch.next() {
            Ok(Some(stmt)) => stmt,
            Ok(None) => break,
            Err(err) => {
                return Err(invalid(format!(
                    "statement {} does not compile: {err}",
                    count + 1
                )))
            }
        };
        count += 1;

        for index in 1..=stmt.parameter_count() {
            if stmt.parameter_name(index).is_none() {
                return Err(invalid(format!(
                    "statement {count} uses a positional parameter; use `:name` parameters"
                )));
            }
        }

        match definition.kind {
            RoutineKind::Function if stmt.column_count() == 0 => {
                return Err(invalid("function body must return rows".to_string()));
            }
            RoutineKind::Procedure if stmt.column_count() > 0 => {
                return Err(invalid(format!(
                    "procedure statement {count} returns rows"
                )));
            }
            _ => {}
        }
    }

    match (definition.kind, count) {
        (_, 0) => Err(invalid("body contains no statements".to_string())),
        (RoutineKind::Function, n) if n > 1 => {
            Err(invalid(format!("function body must be one statement, found {n}")))
        }
        _ => Ok(count),
    }
}

fn read_raw_routine(row: &Row<'_>) -> rusqlite::Result<(String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn parse_routine((name, kind, body): (String, String, String)) -> RoutineResult<RoutineDefinition> {
    let kind = RoutineKind::parse(&kind).ok_or_else(|| RoutineError::InvalidDefinition {
        name: name.clone(),
        message: format!("unknown routine kind `{kind}` in routines.routine_kind"),
    })?;
    Ok(RoutineDefinition { name, kind, body })
}
