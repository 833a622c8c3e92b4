//! Read-only description of the live schema.
//!
//! Lists user tables with their columns and foreign keys, the data a schema
//! diagram is drawn from. Rendering is left to callers.

use super::DbResult;
use rusqlite::Connection;

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    /// 1-based position in the primary key, `0` when not part of it.
    pub primary_key_position: u32,
}

/// One foreign-key column reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyInfo {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub on_update: String,
    pub on_delete: String,
}

/// Table with columns in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

/// Describes every user table, ordered by table name.
pub fn describe_schema(conn: &Connection) -> DbResult<Vec<TableInfo>> {
    let mut stmt = conn.prepare(
        "SELECT name
         FROM sqlite_master
         WHERE type = 'table'
           AND name NOT LIKE 'sqlite_%'
         ORDER BY name ASC;",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        tables.push(TableInfo {
            columns: table_columns(conn, &name)?,
            foreign_keys: table_foreign_keys(conn, &name)?,
            name,
        });
    }
    Ok(tables)
}

fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(
        "SELECT name, type, \"notnull\", pk
         FROM pragma_table_info(?1)
         ORDER BY cid ASC;",
    )?;
    let columns = stmt
        .query_map([table], |row| {
            Ok(ColumnInfo {
                name: row.get(0)?,
                declared_type: row.get(1)?,
                not_null: row.get::<_, i64>(2)? != 0,
                primary_key_position: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

fn table_foreign_keys(conn: &Connection, table: &str) -> DbResult<Vec<ForeignKeyInfo>> {
    let mut stmt = conn.prepare(
        "SELECT \"from\", \"table\", \"to\", on_update, on_delete
         FROM pragma_foreign_key_list(?1)
         ORDER BY id ASC, seq ASC;",
    )?;
    let keys = stmt
        .query_map([table], |row| {
            Ok(ForeignKeyInfo {
                column: row.get(0)?,
                referenced_table: row.get(1)?,
                referenced_column: row.get(2)?,
                on_update: row.get(3)?,
                on_delete: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(keys)
}
