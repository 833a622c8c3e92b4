//! Part and part-drawing repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create, read and delete rows in `parts`.
//! - Maintain the optional single drawing per part in `part_drawings`.
//!
//! # Invariants
//! - `part_id` is generated by the store and never reused.
//! - Deleting a part cascades to its drawing and its vendor links.
//! - A drawing always references an existing part.

use crate::model::catalog::{validate_name, EntityKind, Part, PartDrawing, PartId};
use crate::repo::{is_foreign_key_violation, RepoError, RepoResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for part and drawing operations.
pub trait PartRepository {
    /// Inserts one part and returns its generated id.
    fn create_part(&self, name: &str) -> RepoResult<PartId>;
    /// Loads one part by id.
    fn get_part(&self, id: PartId) -> RepoResult<Option<Part>>;
    /// Lists all parts by id ascending.
    fn list_parts(&self) -> RepoResult<Vec<Part>>;
    /// Deletes one part with its drawing and links. Returns whether a row went away.
    fn delete_part(&self, id: PartId) -> RepoResult<bool>;
    /// Inserts or replaces the drawing of an existing part.
    fn set_part_drawing(&self, drawing: &PartDrawing) -> RepoResult<()>;
    /// Loads the drawing of one part.
    fn get_part_drawing(&self, part_id: PartId) -> RepoResult<Option<PartDrawing>>;
    /// Removes the drawing of one part. Returns whether a row went away.
    fn delete_part_drawing(&self, part_id: PartId) -> RepoResult<bool>;
}

/// SQLite-backed part repository.
pub struct SqlitePartRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePartRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PartRepository for SqlitePartRepository<'_> {
    fn create_part(&self, name: &str) -> RepoResult<PartId> {
        validate_name(EntityKind::Part, name)?;
        let part_id = insert_part(self.conn, name)?;
        debug!("event=part_create module=repo status=ok part_id={part_id}");
        Ok(part_id)
    }

    fn get_part(&self, id: PartId) -> RepoResult<Option<Part>> {
        let part = self
            .conn
            .query_row(
                "SELECT part_id, part_name FROM parts WHERE part_id = ?1;",
                [id],
                parse_part_row,
            )
            .optional()?;
        Ok(part)
    }

    fn list_parts(&self) -> RepoResult<Vec<Part>> {
        let mut stmt = self
            .conn
            .prepare("SELECT part_id, part_name FROM parts ORDER BY part_id ASC;")?;
        let parts = stmt
            .query_map([], parse_part_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts)
    }

    fn delete_part(&self, id: PartId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM parts WHERE part_id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn set_part_drawing(&self, drawing: &PartDrawing) -> RepoResult<()> {
        drawing.validate()?;

        self.conn
            .execute(
                "INSERT INTO part_drawings (part_id, file_extension, drawing_data)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (part_id) DO UPDATE SET
                    file_extension = excluded.file_extension,
                    drawing_data = excluded.drawing_data;",
                params![
                    drawing.part_id,
                    drawing.file_extension.as_str(),
                    drawing.drawing_data.as_slice(),
                ],
            )
            .map_err(|err| {
                if is_foreign_key_violation(&err) {
                    RepoError::Referential {
                        operation: "set_part_drawing",
                        table: "parts",
                        id: drawing.part_id,
                    }
                } else {
                    err.into()
                }
            })?;

        debug!(
            "event=drawing_set module=repo status=ok part_id={} bytes={}",
            drawing.part_id,
            drawing.drawing_data.len()
        );
        Ok(())
    }

    fn get_part_drawing(&self, part_id: PartId) -> RepoResult<Option<PartDrawing>> {
        let drawing = self
            .conn
            .query_row(
                "SELECT part_id, file_extension, drawing_data
                 FROM part_drawings
                 WHERE part_id = ?1;",
                [part_id],
                |row| {
                    Ok(PartDrawing {
                        part_id: row.get("part_id")?,
                        file_extension: row.get("file_extension")?,
                        drawing_data: row.get("drawing_data")?,
                    })
                },
            )
            .optional()?;

        match drawing {
            Some(drawing) => {
                drawing.validate().map_err(|err| {
                    RepoError::InvalidData(format!(
                        "drawing for part {part_id} in part_drawings: {err}"
                    ))
                })?;
                Ok(Some(drawing))
            }
            None => Ok(None),
        }
    }

    fn delete_part_drawing(&self, part_id: PartId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM part_drawings WHERE part_id = ?1;", [part_id])?;
        Ok(changed > 0)
    }
}

/// Inserts one already-validated part name.
pub(crate) fn insert_part(conn: &Connection, name: &str) -> rusqlite::Result<PartId> {
    conn.query_row(
        "INSERT INTO parts (part_name) VALUES (?1) RETURNING part_id;",
        [name],
        |row| row.get(0),
    )
}

pub(crate) fn parse_part_row(row: &Row<'_>) -> rusqlite::Result<Part> {
    Ok(Part {
        part_id: row.get("part_id")?,
        part_name: row.get("part_name")?,
    })
}
