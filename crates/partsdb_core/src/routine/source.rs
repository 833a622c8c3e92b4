//! Routine source collaborators.
//!
//! Source text lives outside the store (files, embedded assets). Loading it
//! is separate from registration: a missing source is `SourceNotFound`, a
//! missing registration is `NotFound`.

use super::{validate_routine_name, RoutineDefinition, RoutineError, RoutineKind, RoutineResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const ROUTINE_FILE_EXTENSION: &str = "sql";

/// Routines shipped with the crate, with their kinds.
pub const BUILTIN_ROUTINES: &[(&str, RoutineKind)] = &[
    ("get_parts_by_vendor", RoutineKind::Function),
    ("add_new_part", RoutineKind::Procedure),
];

/// Supplies raw routine source text by name.
pub trait RoutineSource {
    fn load(&self, name: &str) -> RoutineResult<String>;

    /// Loads source text and pairs it with a name and kind.
    fn load_definition(&self, name: &str, kind: RoutineKind) -> RoutineResult<RoutineDefinition> {
        Ok(RoutineDefinition {
            name: name.to_string(),
            kind,
            body: self.load(name)?,
        })
    }
}

/// Reads `<dir>/<name>.sql`.
#[derive(Debug, Clone)]
pub struct DirRoutineSource {
    dir: PathBuf,
}

impl DirRoutineSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{ROUTINE_FILE_EXTENSION}"))
    }
}

impl RoutineSource for DirRoutineSource {
    fn load(&self, name: &str) -> RoutineResult<String> {
        validate_routine_name(name)?;
        let path = self.path_for(name);
        std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                RoutineError::SourceNotFound {
                    name: name.to_string(),
                    path,
                }
            } else {
                RoutineError::SourceRead { path, source }
            }
        })
    }
}

/// Serves the routine files compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinRoutineSource;

impl RoutineSource for BuiltinRoutineSource {
    fn load(&self, name: &str) -> RoutineResult<String> {
        let body = match name {
            "get_parts_by_vendor" => include_str!("../../sql/routines/get_parts_by_vendor.sql"),
            "add_new_part" => include_str!("../../sql/routines/add_new_part.sql"),
            _ => {
                return Err(RoutineError::SourceNotFound {
                    name: name.to_string(),
                    path: Path::new("builtin").join(format!("{name}.{ROUTINE_FILE_EXTENSION}")),
                })
            }
        };
        Ok(body.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{BuiltinRoutineSource, RoutineSource, BUILTIN_ROUTINES};
    use crate::routine::RoutineError;

    #[test]
    fn every_builtin_routine_has_source() {
        for (name, _) in BUILTIN_ROUTINES {
            let body = BuiltinRoutineSource.load(name).unwrap();
            assert!(!body.trim().is_empty(), "{name} has empty source");
        }
    }

    #[test]
    fn unknown_builtin_is_source_not_found() {
        let err = BuiltinRoutineSource.load("get_vendors").unwrap_err();
        assert!(matches!(
            err,
            RoutineError::SourceNotFound { ref name, .. } if name == "get_vendors"
        ));
    }
}
