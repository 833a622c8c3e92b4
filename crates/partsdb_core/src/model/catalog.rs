//! Vendor, part, drawing and vendor-part link records.
//!
//! # Responsibility
//! - Describe the four catalog entities as plain data.
//! - Validate names and drawing payloads before any SQL runs.
//!
//! # Invariants
//! - Names are non-blank and at most `MAX_NAME_CHARS` characters.
//! - Drawing extensions are non-blank and at most
//!   `MAX_FILE_EXTENSION_CHARS` characters.
//! - Drawing payloads are non-empty.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-generated vendor identifier.
pub type VendorId = i64;

/// Store-generated part identifier.
pub type PartId = i64;

/// Mirrors `VARCHAR(255)` from the catalog table definitions.
pub const MAX_NAME_CHARS: usize = 255;

/// Mirrors `VARCHAR(5)` on `part_drawings.file_extension`.
pub const MAX_FILE_EXTENSION_CHARS: usize = 5;

/// Named entity kinds, used to label validation and lookup errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Vendor,
    Part,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::Part => "part",
        }
    }
}

/// A supplier of parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub vendor_id: VendorId,
    pub vendor_name: String,
}

/// A catalog part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub part_id: PartId,
    pub part_name: String,
}

/// The single technical drawing attached to a part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartDrawing {
    pub part_id: PartId,
    /// File extension without the leading dot, e.g. `png`.
    pub file_extension: String,
    /// Raw drawing bytes.
    pub drawing_data: Vec<u8>,
}

impl PartDrawing {
    /// Builds a drawing record after validating extension and payload.
    pub fn new(
        part_id: PartId,
        file_extension: impl Into<String>,
        drawing_data: Vec<u8>,
    ) -> Result<Self, ValidationError> {
        let drawing = Self {
            part_id,
            file_extension: file_extension.into(),
            drawing_data,
        };
        drawing.validate()?;
        Ok(drawing)
    }

    /// Checks extension length and payload presence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_file_extension(&self.file_extension)?;
        if self.drawing_data.is_empty() {
            return Err(ValidationError::EmptyDrawing);
        }
        Ok(())
    }
}

/// Link row stating that a vendor supplies a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VendorPart {
    pub vendor_id: VendorId,
    pub part_id: PartId,
}

/// Input validation failures raised before touching the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyName {
        entity: EntityKind,
    },
    NameTooLong {
        entity: EntityKind,
        max_chars: usize,
        actual_chars: usize,
    },
    EmptyFileExtension,
    FileExtensionTooLong {
        max_chars: usize,
        actual_chars: usize,
    },
    EmptyDrawing,
    InvalidRoutineName(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName { entity } => write!(f, "{} name cannot be empty", entity.as_str()),
            Self::NameTooLong {
                entity,
                max_chars,
                actual_chars,
            } => write!(
                f,
                "{} name has {actual_chars} characters; at most {max_chars} allowed",
                entity.as_str()
            ),
            Self::EmptyFileExtension => write!(f, "drawing file extension cannot be empty"),
            Self::FileExtensionTooLong {
                max_chars,
                actual_chars,
            } => write!(
                f,
                "drawing file extension has {actual_chars} characters; at most {max_chars} allowed"
            ),
            Self::EmptyDrawing => write!(f, "drawing payload cannot be empty"),
            Self::InvalidRoutineName(name) => write!(
                f,
                "invalid routine name `{name}`; expected letters, digits and underscores"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Validates a vendor or part name.
pub fn validate_name(entity: EntityKind, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName { entity });
    }

    let actual_chars = name.chars().count();
    if actual_chars > MAX_NAME_CHARS {
        return Err(ValidationError::NameTooLong {
            entity,
            max_chars: MAX_NAME_CHARS,
            actual_chars,
        });
    }

    Ok(())
}

fn validate_file_extension(extension: &str) -> Result<(), ValidationError> {
    if extension.trim().is_empty() {
        return Err(ValidationError::EmptyFileExtension);
    }

    let actual_chars = extension.chars().count();
    if actual_chars > MAX_FILE_EXTENSION_CHARS {
        return Err(ValidationError::FileExtensionTooLong {
            max_chars: MAX_FILE_EXTENSION_CHARS,
            actual_chars,
        });
    }

    Ok(())
}
