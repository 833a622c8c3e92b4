//! Connection settings loading and validation.
//!
//! # Responsibility
//! - Turn an external key/value settings mapping into a typed `StoreConfig`.
//! - Read that mapping from one section of a TOML settings file.
//!
//! # Invariants
//! - A `StoreConfig` is only produced from a complete, validated mapping.
//! - Unknown keys are rejected instead of silently ignored.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Section looked up when callers do not name one.
pub const DEFAULT_SECTION: &str = "database";

/// Literal `path` value selecting a process-local in-memory store.
pub const MEMORY_PATH: &str = ":memory:";

const KEY_PATH: &str = "path";
const KEY_BUSY_TIMEOUT_MS: &str = "busy_timeout_ms";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Where the relational store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

impl Display for StoreLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory => write!(f, "{MEMORY_PATH}"),
        }
    }
}

/// Validated connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub location: StoreLocation,
    /// Upper bound for waiting on a locked database.
    pub busy_timeout: Duration,
}

/// On-disk shape of the settings section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoreSettings {
    path: String,
    busy_timeout_ms: Option<u64>,
}

/// Settings loading or validation failure.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    MissingSection(String),
    MissingKey(&'static str),
    UnknownKey(String),
    InvalidValue {
        key: String,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read settings file `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid settings file: {err}"),
            Self::MissingSection(section) => write!(f, "settings section `{section}` not found"),
            Self::MissingKey(key) => write!(f, "required setting `{key}` is missing"),
            Self::UnknownKey(key) => write!(f, "unknown setting `{key}`"),
            Self::InvalidValue { key, message } => write!(f, "invalid setting `{key}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::MissingSection(_)
            | Self::MissingKey(_)
            | Self::UnknownKey(_)
            | Self::InvalidValue { .. } => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl StoreConfig {
    /// Builds a file-backed config with the default busy timeout.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }

    /// Builds an in-memory config with the default busy timeout.
    pub fn memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }

    /// Validates a raw settings mapping.
    ///
    /// # Errors
    /// - `MissingKey` when `path` is absent.
    /// - `InvalidValue` when `path` is blank or `busy_timeout_ms` is not an
    ///   unsigned integer.
    /// - `UnknownKey` for any other key.
    pub fn from_settings(settings: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        if let Some(unknown) = settings
            .keys()
            .find(|key| key.as_str() != KEY_PATH && key.as_str() != KEY_BUSY_TIMEOUT_MS)
        {
            return Err(ConfigError::UnknownKey(unknown.clone()));
        }

        let raw_path = settings
            .get(KEY_PATH)
            .ok_or(ConfigError::MissingKey(KEY_PATH))?;
        let busy_timeout_ms = match settings.get(KEY_BUSY_TIMEOUT_MS) {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|err| ConfigError::InvalidValue {
                    key: KEY_BUSY_TIMEOUT_MS.to_string(),
                    message: format!("`{value}` is not a millisecond count: {err}"),
                })?,
            None => DEFAULT_BUSY_TIMEOUT_MS,
        };

        Self::build(raw_path, busy_timeout_ms)
    }

    /// Parses one section of a TOML document into a validated config.
    ///
    /// Unknown keys and mistyped values in the section surface as `Parse`.
    pub fn from_toml_str(text: &str, section: &str) -> Result<Self, ConfigError> {
        let mut document = text.parse::<toml::Table>()?;
        let settings: StoreSettings = document
            .remove(section)
            .ok_or_else(|| ConfigError::MissingSection(section.to_string()))?
            .try_into()?;

        Self::build(
            &settings.path,
            settings.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
        )
    }

    fn build(raw_path: &str, busy_timeout_ms: u64) -> Result<Self, ConfigError> {
        let trimmed = raw_path.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: KEY_PATH.to_string(),
                message: "path cannot be empty".to_string(),
            });
        }
        let location = if trimmed == MEMORY_PATH {
            StoreLocation::Memory
        } else {
            StoreLocation::File(PathBuf::from(trimmed))
        };

        Ok(Self {
            location,
            busy_timeout: Duration::from_millis(busy_timeout_ms),
        })
    }

    /// Reads a TOML settings file and validates the given section.
    pub fn load(path: impl AsRef<Path>, section: &str) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, section)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig, StoreLocation, DEFAULT_SECTION};
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn settings(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn from_settings_requires_path() {
        let err = StoreConfig::from_settings(&settings(&[("busy_timeout_ms", "10")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("path")));
    }

    #[test]
    fn from_settings_rejects_blank_path_and_bad_timeout() {
        let err = StoreConfig::from_settings(&settings(&[("path", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "path"));

        let err = StoreConfig::from_settings(&settings(&[
            ("path", "catalog.db"),
            ("busy_timeout_ms", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "busy_timeout_ms"
        ));
    }

    #[test]
    fn from_settings_rejects_unknown_keys() {
        let err = StoreConfig::from_settings(&settings(&[
            ("path", "catalog.db"),
            ("host", "localhost"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey(ref key) if key == "host"));
    }

    #[test]
    fn from_toml_reads_named_section() {
        let config = StoreConfig::from_toml_str(
            "[database]\npath = \"/tmp/catalog.db\"\nbusy_timeout_ms = 250\n",
            DEFAULT_SECTION,
        )
        .unwrap();
        assert_eq!(
            config.location,
            StoreLocation::File("/tmp/catalog.db".into())
        );
        assert_eq!(config.busy_timeout, Duration::from_millis(250));

        let memory = StoreConfig::from_toml_str("[database]\npath = \":memory:\"\n", "database")
            .unwrap();
        assert_eq!(memory.location, StoreLocation::Memory);
    }

    #[test]
    fn from_toml_reports_missing_section() {
        let err = StoreConfig::from_toml_str("[postgresql]\npath = \"x\"\n", DEFAULT_SECTION)
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection(ref section) if section == "database"));
    }

    #[test]
    fn from_toml_rejects_unknown_and_mistyped_keys() {
        let err = StoreConfig::from_toml_str(
            "[database]\npath = \"catalog.db\"\nhost = \"localhost\"\n",
            DEFAULT_SECTION,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "unexpected error: {err}");

        let err = StoreConfig::from_toml_str(
            "[database]\npath = \"catalog.db\"\nbusy_timeout_ms = \"soon\"\n",
            DEFAULT_SECTION,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "unexpected error: {err}");

        let err = StoreConfig::from_toml_str("[database]\npath = \" \"\n", DEFAULT_SECTION)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "path"));
    }
}
