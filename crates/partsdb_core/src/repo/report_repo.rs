//! Aggregation reader: parts folded with their vendor names.
//!
//! # Responsibility
//! - Join `parts` -> `vendor_parts` -> `vendors` with outer joins.
//! - Fold the one-to-many join into one `PartWithVendors` per part.
//!
//! # Invariants
//! - Every part appears exactly once, including parts without vendors.
//! - Parts are ordered by `part_id ASC`; vendor names by `vendor_id ASC`.
//! - Unmatched join rows never leak a placeholder into `vendor_names`.

use crate::model::catalog::PartId;
use crate::repo::RepoResult;
use rusqlite::{Connection, Params};
use serde::{Deserialize, Serialize};

const PART_VENDOR_JOIN_SQL: &str = "SELECT
    p.part_id,
    p.part_name,
    v.vendor_name
FROM parts p
LEFT JOIN vendor_parts vp ON vp.part_id = p.part_id
LEFT JOIN vendors v ON v.vendor_id = vp.vendor_id";

/// Read model: one part with the names of every vendor supplying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartWithVendors {
    pub part_id: PartId,
    pub part_name: String,
    /// Empty when no vendor supplies the part.
    pub vendor_names: Vec<String>,
}

/// Repository interface for aggregated part reads.
pub trait AggregationReader {
    /// Lists every part with its vendor names, by part id ascending.
    fn list_parts_with_vendors(&self) -> RepoResult<Vec<PartWithVendors>>;
    /// Loads one part with its vendor names.
    fn get_part_with_vendors(&self, part_id: PartId) -> RepoResult<Option<PartWithVendors>>;
}

/// SQLite-backed aggregation reader.
pub struct SqliteAggregationReader<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAggregationReader<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_joined(&self, filter: &str, params: impl Params) -> RepoResult<Vec<PartWithVendors>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PART_VENDOR_JOIN_SQL}
             {filter}
             ORDER BY p.part_id ASC, vp.vendor_id ASC;"
        ))?;
        let rows = stmt
            .query_map(params, |row| {
                Ok((
                    row.get::<_, PartId>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(fold_part_vendor_rows(rows))
    }
}

impl AggregationReader for SqliteAggregationReader<'_> {
    fn list_parts_with_vendors(&self) -> RepoResult<Vec<PartWithVendors>> {
        self.query_joined("", [])
    }

    fn get_part_with_vendors(&self, part_id: PartId) -> RepoResult<Option<PartWithVendors>> {
        Ok(self
            .query_joined("WHERE p.part_id = ?1", [part_id])?
            .into_iter()
            .next())
    }
}

/// Folds ordered `(part_id, part_name, vendor_name?)` join rows into one
/// record per part.
///
/// Rows must arrive grouped by part. `None` vendor names come from parts
/// with no links and are dropped, not kept as placeholders.
pub fn fold_part_vendor_rows<I>(rows: I) -> Vec<PartWithVendors>
where
    I: IntoIterator<Item = (PartId, String, Option<String>)>,
{
    let mut folded: Vec<PartWithVendors> = Vec::new();
    for (part_id, part_name, vendor_name) in rows {
        let starts_new_part = folded.last().map_or(true, |last| last.part_id != part_id);
        if starts_new_part {
            folded.push(PartWithVendors {
                part_id,
                part_name,
                vendor_names: Vec::new(),
            });
        }

        if let (Some(name), Some(current)) = (vendor_name, folded.last_mut()) {
            current.vendor_names.push(name);
        }
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::fold_part_vendor_rows;

    #[test]
    fn fold_groups_consecutive_rows_per_part() {
        let folded = fold_part_vendor_rows(vec![
            (1, "SIM Tray".to_string(), Some("3M Co.".to_string())),
            (1, "SIM Tray".to_string(), Some("AKM Semiconductor Inc.".to_string())),
            (2, "Speaker".to_string(), Some("Asahi Glass Co Ltd.".to_string())),
        ]);

        assert_eq!(folded.len(), 2);
        assert_eq!(
            folded[0].vendor_names,
            vec!["3M Co.".to_string(), "AKM Semiconductor Inc.".to_string()]
        );
        assert_eq!(folded[1].part_name, "Speaker");
    }

    #[test]
    fn fold_drops_null_vendor_names_entirely() {
        let folded = fold_part_vendor_rows(vec![
            (4, "Antenna".to_string(), None),
            (5, "Home Button".to_string(), None),
            (5, "Home Button".to_string(), Some("Foster Electric Co. Ltd.".to_string())),
        ]);

        assert!(folded[0].vendor_names.is_empty());
        assert_eq!(folded[1].vendor_names, vec!["Foster Electric Co. Ltd.".to_string()]);
    }

    #[test]
    fn fold_of_no_rows_is_empty() {
        assert!(fold_part_vendor_rows(Vec::new()).is_empty());
    }
}
