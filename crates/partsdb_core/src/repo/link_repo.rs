//! Relationship writer: multi-statement catalog writes.
//!
//! # Responsibility
//! - Create a part together with its vendor links in one transaction.
//! - Create and remove single vendor-part links.
//! - Insert vendor batches atomically.
//!
//! # Invariants
//! - Every method that issues more than one statement runs inside a single
//!   `IMMEDIATE` transaction; nothing is committed unless every statement
//!   succeeded.
//! - A part created by `add_part_with_vendors` is never visible without its
//!   full link set.
//! - Links are inserted in ascending vendor id order, so the reported
//!   missing vendor is the smallest absent id.

use crate::model::catalog::{validate_name, EntityKind, PartId, VendorId, VendorPart};
use crate::repo::part_repo::insert_part;
use crate::repo::vendor_repo::insert_vendor;
use crate::repo::{is_foreign_key_violation, is_unique_violation, RepoError, RepoResult};
use log::{debug, warn};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::collections::BTreeSet;

const VENDOR_EXISTS_SQL: &str = "SELECT EXISTS(SELECT 1 FROM vendors WHERE vendor_id = ?1);";
const PART_EXISTS_SQL: &str = "SELECT EXISTS(SELECT 1 FROM parts WHERE part_id = ?1);";

/// Repository interface for writes spanning several rows.
pub trait RelationshipWriter {
    /// Inserts a part and links it to every vendor in `vendor_ids`, atomically.
    fn add_part_with_vendors(
        &mut self,
        part_name: &str,
        vendor_ids: &BTreeSet<VendorId>,
    ) -> RepoResult<PartId>;
    /// Inserts several vendors in one transaction, returning ids in input order.
    fn create_vendors(&mut self, names: &[String]) -> RepoResult<Vec<VendorId>>;
    /// Links an existing vendor to an existing part.
    fn link_vendor_part(&mut self, vendor_id: VendorId, part_id: PartId) -> RepoResult<()>;
    /// Removes one link. Returns whether a row went away.
    fn unlink_vendor_part(&mut self, vendor_id: VendorId, part_id: PartId) -> RepoResult<bool>;
    /// Lists links ordered by `(vendor_id, part_id)`.
    fn list_vendor_parts(&self) -> RepoResult<Vec<VendorPart>>;
}

/// SQLite-backed relationship writer.
pub struct SqliteRelationshipWriter<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteRelationshipWriter<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl RelationshipWriter for SqliteRelationshipWriter<'_> {
    fn add_part_with_vendors(
        &mut self,
        part_name: &str,
        vendor_ids: &BTreeSet<VendorId>,
    ) -> RepoResult<PartId> {
        validate_name(EntityKind::Part, part_name)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let part_id = insert_part(&tx, part_name)?;

        for &vendor_id in vendor_ids {
            if let Err(err) = insert_link(&tx, vendor_id, part_id) {
                // Dropping `tx` rolls back the part insert as well.
                warn!(
                    "event=part_with_vendors module=repo status=rolled_back vendor_id={vendor_id} error={err}"
                );
                return Err(if is_foreign_key_violation(&err) {
                    RepoError::Referential {
                        operation: "add_part_with_vendors",
                        table: "vendors",
                        id: vendor_id,
                    }
                } else {
                    err.into()
                });
            }
        }

        tx.commit()?;
        debug!(
            "event=part_with_vendors module=repo status=ok part_id={part_id} links={}",
            vendor_ids.len()
        );
        Ok(part_id)
    }

    fn create_vendors(&mut self, names: &[String]) -> RepoResult<Vec<VendorId>> {
        for name in names {
            validate_name(EntityKind::Vendor, name)?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            ids.push(insert_vendor(&tx, name)?);
        }
        tx.commit()?;

        debug!(
            "event=vendor_batch_create module=repo status=ok count={}",
            ids.len()
        );
        Ok(ids)
    }

    fn link_vendor_part(&mut self, vendor_id: VendorId, part_id: PartId) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !row_exists(&tx, VENDOR_EXISTS_SQL, vendor_id)? {
            return Err(RepoError::Referential {
                operation: "link_vendor_part",
                table: "vendors",
                id: vendor_id,
            });
        }
        if !row_exists(&tx, PART_EXISTS_SQL, part_id)? {
            return Err(RepoError::Referential {
                operation: "link_vendor_part",
                table: "parts",
                id: part_id,
            });
        }

        insert_link(&tx, vendor_id, part_id).map_err(|err| {
            if is_unique_violation(&err) {
                RepoError::Conflict(format!(
                    "vendor {vendor_id} is already linked to part {part_id}"
                ))
            } else {
                err.into()
            }
        })?;
        tx.commit()?;
        Ok(())
    }

    fn unlink_vendor_part(&mut self, vendor_id: VendorId, part_id: PartId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM vendor_parts WHERE vendor_id = ?1 AND part_id = ?2;",
            params![vendor_id, part_id],
        )?;
        Ok(changed > 0)
    }

    fn list_vendor_parts(&self) -> RepoResult<Vec<VendorPart>> {
        let mut stmt = self.conn.prepare(
            "SELECT vendor_id, part_id
             FROM vendor_parts
             ORDER BY vendor_id ASC, part_id ASC;",
        )?;
        let links = stmt
            .query_map([], |row| {
                Ok(VendorPart {
                    vendor_id: row.get(0)?,
                    part_id: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(links)
    }
}

fn insert_link(
    tx: &Transaction<'_>,
    vendor_id: VendorId,
    part_id: PartId,
) -> rusqlite::Result<usize> {
    tx.execute(
        "INSERT INTO vendor_parts (vendor_id, part_id) VALUES (?1, ?2);",
        params![vendor_id, part_id],
    )
}

fn row_exists(tx: &Transaction<'_>, sql: &str, id: i64) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(sql, [id], |row| row.get(0))?;
    Ok(exists == 1)
}
