//! Store-resident routines: registration, lookup and invocation.
//!
//! # Responsibility
//! - Keep named SQL functions/procedures in the `routines` catalog table.
//! - Invoke them with named, bound parameters.
//! - Load routine source text from an external collaborator.
//!
//! # Invariants
//! - Routine names match `[A-Za-z_][A-Za-z0-9_]*`.
//! - Only definitions that compile against the live schema are stored.
//! - A routine is only invoked through the entry point matching its kind.

use crate::db::DbError;
use crate::model::catalog::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod invoker;
pub mod registry;
pub mod source;

static ROUTINE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid routine name regex"));

pub type RoutineResult<T> = Result<T, RoutineError>;

/// Routine flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineKind {
    /// Single query returning rows.
    Function,
    /// One or more statements run in a transaction, returning nothing.
    Procedure,
}

impl RoutineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Procedure => "procedure",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "function" => Some(Self::Function),
            "procedure" => Some(Self::Procedure),
            _ => None,
        }
    }
}

impl Display for RoutineKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineDefinition {
    pub name: String,
    pub kind: RoutineKind,
    /// SQL source using named parameters (`:name`).
    pub body: String,
}

/// Routine registration, lookup or invocation failure.
#[derive(Debug)]
pub enum RoutineError {
    Validation(ValidationError),
    /// No routine with this name was registered with the store.
    NotFound(String),
    /// The source collaborator has no text for this name.
    SourceNotFound {
        name: String,
        path: PathBuf,
    },
    SourceRead {
        path: PathBuf,
        source: std::io::Error,
    },
    KindMismatch {
        name: String,
        expected: RoutineKind,
        actual: RoutineKind,
    },
    InvalidDefinition {
        name: String,
        message: String,
    },
    MissingArgument {
        routine: String,
        parameter: String,
    },
    UnknownArgument {
        routine: String,
        argument: String,
    },
    /// A statement inside the routine violated a table constraint.
    ConstraintViolation {
        routine: String,
        message: String,
    },
    Db(DbError),
}

impl Display for RoutineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(name) => write!(f, "routine not registered: `{name}`"),
            Self::SourceNotFound { name, path } => write!(
                f,
                "routine source for `{name}` not found at `{}`",
                path.display()
            ),
            Self::SourceRead { path, source } => write!(
                f,
                "failed to read routine source `{}`: {source}",
                path.display()
            ),
            Self::KindMismatch {
                name,
                expected,
                actual,
            } => write!(f, "routine `{name}` is a {actual}, not a {expected}"),
            Self::InvalidDefinition { name, message } => {
                write!(f, "invalid definition for routine `{name}`: {message}")
            }
            Self::MissingArgument { routine, parameter } => {
                write!(f, "routine `{routine}` requires argument `{parameter}`")
            }
            Self::UnknownArgument { routine, argument } => {
                write!(f, "routine `{routine}` has no parameter `{argument}`")
            }
            Self::ConstraintViolation { routine, message } => {
                write!(f, "routine `{routine}` violated a constraint: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RoutineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::SourceRead { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RoutineError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RoutineError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RoutineError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Rejects names that could not be stored or used as a file stem.
pub fn validate_routine_name(name: &str) -> Result<(), ValidationError> {
    if ROUTINE_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::InvalidRoutineName(name.to_string()))
    }
}
