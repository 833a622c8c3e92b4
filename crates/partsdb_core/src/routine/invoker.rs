//! Routine invocation with named, bound parameters.
//!
//! # Responsibility
//! - Resolve a registered routine and verify its kind.
//! - Bind caller arguments by name and run the stored body.
//! - Map function rows into caller-defined records.
//!
//! # Invariants
//! - Every body parameter is bound; every supplied argument is used.
//! - A procedure call is all-or-nothing: one transaction per call.

use super::registry::{RoutineRegistry, SqliteRoutineRegistry};
use super::{RoutineDefinition, RoutineError, RoutineKind, RoutineResult};
use log::{debug, warn};
use rusqlite::types::ToSql;
use rusqlite::{Batch, Connection, Row, Statement, TransactionBehavior};

/// Named routine arguments, as produced by `rusqlite::named_params!`.
pub type RoutineArgs<'a> = &'a [(&'a str, &'a dyn ToSql)];

/// Executes registered routines over one connection.
pub struct SqliteRoutineInvoker<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteRoutineInvoker<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Runs a function routine and maps each returned row with `map_row`.
    ///
    /// # Errors
    /// - `NotFound` when no routine named `name` is registered.
    /// - `KindMismatch` when `name` is a procedure.
    /// - `MissingArgument` / `UnknownArgument` on argument mismatch.
    pub fn call_function<T, F>(
        &self,
        name: &str,
        args: RoutineArgs<'_>,
        mut map_row: F,
    ) -> RoutineResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let definition = resolve(self.conn, name, RoutineKind::Function)?;

        let mut batch = Batch::new(self.conn, &definition.body);
        let mut stmt = batch
            .next()?
            .ok_or_else(|| RoutineError::InvalidDefinition {
                name: definition.name.clone(),
                message: "body contains no statements".to_string(),
            })?;

        let mut used = vec![false; args.len()];
        bind_arguments(&mut stmt, &definition.name, args, &mut used)?;
        reject_unused_arguments(&definition.name, args, &used)?;

        let mut rows = stmt.raw_query();
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(map_row(row)?);
        }

        debug!(
            "event=routine_call module=routine status=ok name={} kind=function rows={}",
            definition.name,
            records.len()
        );
        Ok(records)
    }

    /// Runs a procedure routine inside one transaction.
    ///
    /// # Errors
    /// Same as [`Self::call_function`], plus `ConstraintViolation` when a
    /// statement breaks a table constraint. Any error rolls back every
    /// statement of the call.
    pub fn call_procedure(&mut self, name: &str, args: RoutineArgs<'_>) -> RoutineResult<()> {
        let definition = resolve(self.conn, name, RoutineKind::Procedure)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut used = vec![false; args.len()];
        let mut executed = 0;
        {
            let mut batch = Batch::new(&tx, &definition.body);
            while let Some(mut stmt) = batch.next()? {
                bind_arguments(&mut stmt, &definition.name, args, &mut used)?;
                if let Err(err) = stmt.raw_execute() {
                    warn!(
                        "event=routine_call module=routine status=rolled_back name={} kind=procedure statement={} error={err}",
                        definition.name,
                        executed + 1
                    );
                    return Err(map_execute_error(&definition.name, err));
                }
                executed += 1;
            }
        }
        reject_unused_arguments(&definition.name, args, &used)?;
        tx.commit()?;

        debug!(
            "event=routine_call module=routine status=ok name={} kind=procedure statements={executed}",
            definition.name
        );
        Ok(())
    }
}

fn resolve(
    conn: &Connection,
    name: &str,
    expected: RoutineKind,
) -> RoutineResult<RoutineDefinition> {
    let definition = SqliteRoutineRegistry::new(conn)
        .get_routine(name)?
        .ok_or_else(|| RoutineError::NotFound(name.to_string()))?;
    if definition.kind != expected {
        return Err(RoutineError::KindMismatch {
            name: definition.name,
            expected,
            actual: definition.kind,
        });
    }
    Ok(definition)
}

fn bind_arguments(
    stmt: &mut Statement<'_>,
    routine: &str,
    args: RoutineArgs<'_>,
    used: &mut [bool],
) -> RoutineResult<()> {
    for index in 1..=stmt.parameter_count() {
        let parameter = stmt
            .parameter_name(index)
            .ok_or_else(|| RoutineError::InvalidDefinition {
                name: routine.to_string(),
                message: format!("parameter {index} is positional"),
            })?
            .to_string();
        let position = args
            .iter()
            .position(|(argument, _)| *argument == parameter)
            .ok_or_else(|| RoutineError::MissingArgument {
                routine: routine.to_string(),
                parameter: parameter.clone(),
            })?;
        used[position] = true;
        stmt.raw_bind_parameter(index, args[position].1)?;
    }
    Ok(())
}

fn reject_unused_arguments(
    routine: &str,
    args: RoutineArgs<'_>,
    used: &[bool],
) -> RoutineResult<()> {
    match args.iter().zip(used).find(|(_, used)| !**used) {
        Some(((argument, _), _)) => Err(RoutineError::UnknownArgument {
            routine: routine.to_string(),
            argument: argument.to_string(),
        }),
        None => Ok(()),
    }
}

fn map_execute_error(routine: &str, err: rusqlite::Error) -> RoutineError {
    let is_constraint = matches!(
        &err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation
    );
    if is_constraint {
        RoutineError::ConstraintViolation {
            routine: routine.to_string(),
            message: err.to_string(),
        }
    } else {
        err.into()
    }
}
