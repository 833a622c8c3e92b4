//! Vendor repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create, read, rename and delete rows in `vendors`.
//!
//! # Invariants
//! - `vendor_id` is generated by the store (`AUTOINCREMENT`) and never reused.
//! - Listing is ordered by `vendor_id ASC`.
//! - Renaming an absent vendor yields `None`; the table is left unchanged.

use crate::model::catalog::{validate_name, EntityKind, Vendor, VendorId};
use crate::repo::RepoResult;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for single-vendor operations.
pub trait VendorRepository {
    /// Inserts one vendor and returns its generated id.
    fn create_vendor(&self, name: &str) -> RepoResult<VendorId>;
    /// Loads one vendor by id.
    fn get_vendor(&self, id: VendorId) -> RepoResult<Option<Vendor>>;
    /// Lists all vendors by id ascending.
    fn list_vendors(&self) -> RepoResult<Vec<Vendor>>;
    /// Renames one vendor and returns its new state, or `None` if absent.
    fn update_vendor(&self, id: VendorId, new_name: &str) -> RepoResult<Option<Vendor>>;
    /// Deletes one vendor; its supply links cascade. Returns whether a row went away.
    fn delete_vendor(&self, id: VendorId) -> RepoResult<bool>;
}

/// SQLite-backed vendor repository.
pub struct SqliteVendorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVendorRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl VendorRepository for SqliteVendorRepository<'_> {
    fn create_vendor(&self, name: &str) -> RepoResult<VendorId> {
        validate_name(EntityKind::Vendor, name)?;
        let vendor_id = insert_vendor(self.conn, name)?;
        debug!("event=vendor_create module=repo status=ok vendor_id={vendor_id}");
        Ok(vendor_id)
    }

    fn get_vendor(&self, id: VendorId) -> RepoResult<Option<Vendor>> {
        let vendor = self
            .conn
            .query_row(
                "SELECT vendor_id, vendor_name FROM vendors WHERE vendor_id = ?1;",
                [id],
                parse_vendor_row,
            )
            .optional()?;
        Ok(vendor)
    }

    fn list_vendors(&self) -> RepoResult<Vec<Vendor>> {
        let mut stmt = self
            .conn
            .prepare("SELECT vendor_id, vendor_name FROM vendors ORDER BY vendor_id ASC;")?;
        let vendors = stmt
            .query_map([], parse_vendor_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(vendors)
    }

    fn update_vendor(&self, id: VendorId, new_name: &str) -> RepoResult<Option<Vendor>> {
        validate_name(EntityKind::Vendor, new_name)?;

        let updated = self
            .conn
            .query_row(
                "UPDATE vendors
                 SET vendor_name = ?1
                 WHERE vendor_id = ?2
                 RETURNING vendor_id, vendor_name;",
                params![new_name, id],
                parse_vendor_row,
            )
            .optional()?;

        match &updated {
            Some(_) => debug!("event=vendor_update module=repo status=ok vendor_id={id}"),
            None => debug!("event=vendor_update module=repo status=not_found vendor_id={id}"),
        }
        Ok(updated)
    }

    fn delete_vendor(&self, id: VendorId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM vendors WHERE vendor_id = ?1;", [id])?;
        Ok(changed > 0)
    }
}

/// Inserts one already-validated vendor name.
pub(crate) fn insert_vendor(conn: &Connection, name: &str) -> rusqlite::Result<VendorId> {
    conn.query_row(
        "INSERT INTO vendors (vendor_name) VALUES (?1) RETURNING vendor_id;",
        [name],
        |row| row.get(0),
    )
}

fn parse_vendor_row(row: &Row<'_>) -> rusqlite::Result<Vendor> {
    Ok(Vendor {
        vendor_id: row.get("vendor_id")?,
        vendor_name: row.get("vendor_name")?,
    })
}
