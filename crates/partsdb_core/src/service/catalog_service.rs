//! Catalog use-case service.
//!
//! # Responsibility
//! - Provide one entry point per catalog operation for CLI and embedders.
//! - Acquire a scoped connection for every call and release it on every
//!   exit path.
//! - Emit one structured log event per operation.
//!
//! # Invariants
//! - No connection outlives the call that opened it.
//! - Service APIs never bypass repository validation or transactions.
//! - Nothing is retried; failures are returned to the caller unchanged.

use crate::config::StoreConfig;
use crate::db::introspect::{describe_schema, TableInfo};
use crate::db::{DbError, DbResult, Store};
use crate::model::catalog::{Part, PartDrawing, PartId, Vendor, VendorId, VendorPart};
use crate::repo::link_repo::{RelationshipWriter, SqliteRelationshipWriter};
use crate::repo::part_repo::{parse_part_row, PartRepository, SqlitePartRepository};
use crate::repo::report_repo::{AggregationReader, PartWithVendors, SqliteAggregationReader};
use crate::repo::vendor_repo::{SqliteVendorRepository, VendorRepository};
use crate::repo::RepoResult;
use crate::routine::invoker::{RoutineArgs, SqliteRoutineInvoker};
use crate::routine::registry::{RoutineRegistry, SqliteRoutineRegistry};
use crate::routine::source::{BuiltinRoutineSource, RoutineSource, BUILTIN_ROUTINES};
use crate::routine::{RoutineDefinition, RoutineKind, RoutineResult};
use log::{debug, warn};
use rusqlite::{named_params, Connection, Row};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::time::Instant;

/// Use-case service over one configured store.
pub struct CatalogService {
    store: Store,
}

impl CatalogService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Builds the store from validated settings.
    pub fn open(config: StoreConfig) -> DbResult<Self> {
        Ok(Self::new(Store::new(config)?))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Creates the catalog schema when missing. Idempotent.
    pub fn ensure_schema(&self) -> DbResult<usize> {
        self.store.ensure_schema()
    }

    /// Describes tables, columns and foreign keys of the live store.
    pub fn describe_schema(&self) -> DbResult<Vec<TableInfo>> {
        self.with_connection("schema_describe", |conn| describe_schema(conn))
    }

    pub fn create_vendor(&self, name: &str) -> RepoResult<VendorId> {
        self.with_connection("vendor_create", |conn| {
            SqliteVendorRepository::new(conn).create_vendor(name)
        })
    }

    /// Inserts several vendors atomically; ids follow input order.
    pub fn create_vendors(&self, names: &[String]) -> RepoResult<Vec<VendorId>> {
        self.with_connection("vendor_batch_create", |conn| {
            SqliteRelationshipWriter::new(conn).create_vendors(names)
        })
    }

    pub fn get_vendor(&self, id: VendorId) -> RepoResult<Option<Vendor>> {
        self.with_connection("vendor_get", |conn| {
            SqliteVendorRepository::new(conn).get_vendor(id)
        })
    }

    pub fn list_vendors(&self) -> RepoResult<Vec<Vendor>> {
        self.with_connection("vendor_list", |conn| {
            SqliteVendorRepository::new(conn).list_vendors()
        })
    }

    /// Renames a vendor. `Ok(None)` means no vendor has this id.
    pub fn update_vendor(&self, id: VendorId, new_name: &str) -> RepoResult<Option<Vendor>> {
        self.with_connection("vendor_update", |conn| {
            SqliteVendorRepository::new(conn).update_vendor(id, new_name)
        })
    }

    pub fn delete_vendor(&self, id: VendorId) -> RepoResult<bool> {
        self.with_connection("vendor_delete", |conn| {
            SqliteVendorRepository::new(conn).delete_vendor(id)
        })
    }

    pub fn create_part(&self, name: &str) -> RepoResult<PartId> {
        self.with_connection("part_create", |conn| {
            SqlitePartRepository::new(conn).create_part(name)
        })
    }

    pub fn get_part(&self, id: PartId) -> RepoResult<Option<Part>> {
        self.with_connection("part_get", |conn| SqlitePartRepository::new(conn).get_part(id))
    }

    pub fn list_parts(&self) -> RepoResult<Vec<Part>> {
        self.with_connection("part_list", |conn| SqlitePartRepository::new(conn).list_parts())
    }

    pub fn delete_part(&self, id: PartId) -> RepoResult<bool> {
        self.with_connection("part_delete", |conn| {
            SqlitePartRepository::new(conn).delete_part(id)
        })
    }

    /// Inserts or replaces the drawing of an existing part.
    pub fn set_part_drawing(
        &self,
        part_id: PartId,
        file_extension: &str,
        drawing_data: Vec<u8>,
    ) -> RepoResult<()> {
        let drawing = PartDrawing::new(part_id, file_extension, drawing_data)?;
        self.with_connection("drawing_set", |conn| {
            SqlitePartRepository::new(conn).set_part_drawing(&drawing)
        })
    }

    pub fn get_part_drawing(&self, part_id: PartId) -> RepoResult<Option<PartDrawing>> {
        self.with_connection("drawing_get", |conn| {
            SqlitePartRepository::new(conn).get_part_drawing(part_id)
        })
    }

    pub fn delete_part_drawing(&self, part_id: PartId) -> RepoResult<bool> {
        self.with_connection("drawing_delete", |conn| {
            SqlitePartRepository::new(conn).delete_part_drawing(part_id)
        })
    }

    /// Creates a part linked to every vendor in `vendor_ids`, all-or-nothing.
    pub fn add_part_with_vendors(
        &self,
        part_name: &str,
        vendor_ids: &BTreeSet<VendorId>,
    ) -> RepoResult<PartId> {
        self.with_connection("part_with_vendors", |conn| {
            SqliteRelationshipWriter::new(conn).add_part_with_vendors(part_name, vendor_ids)
        })
    }

    pub fn link_vendor_part(&self, vendor_id: VendorId, part_id: PartId) -> RepoResult<()> {
        self.with_connection("link_create", |conn| {
            SqliteRelationshipWriter::new(conn).link_vendor_part(vendor_id, part_id)
        })
    }

    pub fn unlink_vendor_part(&self, vendor_id: VendorId, part_id: PartId) -> RepoResult<bool> {
        self.with_connection("link_delete", |conn| {
            SqliteRelationshipWriter::new(conn).unlink_vendor_part(vendor_id, part_id)
        })
    }

    pub fn list_vendor_parts(&self) -> RepoResult<Vec<VendorPart>> {
        self.with_connection("link_list", |conn| {
            SqliteRelationshipWriter::new(conn).list_vendor_parts()
        })
    }

    /// Lists every part with its vendor names, by part id ascending.
    pub fn list_parts_with_vendors(&self) -> RepoResult<Vec<PartWithVendors>> {
        self.with_connection("parts_with_vendors", |conn| {
            SqliteAggregationReader::new(conn).list_parts_with_vendors()
        })
    }

    pub fn get_part_with_vendors(&self, part_id: PartId) -> RepoResult<Option<PartWithVendors>> {
        self.with_connection("part_with_vendors_get", |conn| {
            SqliteAggregationReader::new(conn).get_part_with_vendors(part_id)
        })
    }

    /// Creates or replaces a routine definition.
    pub fn register_routine(&self, definition: &RoutineDefinition) -> RoutineResult<()> {
        self.with_connection("routine_register", |conn| {
            SqliteRoutineRegistry::new(conn).register_routine(definition)
        })
    }

    /// Loads source text from `source` and registers it under `name`.
    pub fn register_routine_from_source(
        &self,
        source: &dyn RoutineSource,
        name: &str,
        kind: RoutineKind,
    ) -> RoutineResult<()> {
        let definition = source.load_definition(name, kind)?;
        self.register_routine(&definition)
    }

    /// Registers every routine shipped with the crate. Idempotent.
    pub fn install_builtin_routines(&self) -> RoutineResult<usize> {
        for (name, kind) in BUILTIN_ROUTINES {
            self.register_routine_from_source(&BuiltinRoutineSource, name, *kind)?;
        }
        Ok(BUILTIN_ROUTINES.len())
    }

    pub fn list_routines(&self) -> RoutineResult<Vec<RoutineDefinition>> {
        self.with_connection("routine_list", |conn| {
            SqliteRoutineRegistry::new(conn).list_routines()
        })
    }

    pub fn drop_routine(&self, name: &str) -> RoutineResult<bool> {
        self.with_connection("routine_drop", |conn| {
            SqliteRoutineRegistry::new(conn).drop_routine(name)
        })
    }

    /// Runs a registered function and maps its rows with `map_row`.
    pub fn call_function<T, F>(
        &self,
        name: &str,
        args: RoutineArgs<'_>,
        map_row: F,
    ) -> RoutineResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.with_connection("routine_call_function", |conn| {
            SqliteRoutineInvoker::new(conn).call_function(name, args, map_row)
        })
    }

    /// Runs a registered procedure in one transaction.
    pub fn call_procedure(&self, name: &str, args: RoutineArgs<'_>) -> RoutineResult<()> {
        self.with_connection("routine_call_procedure", |conn| {
            SqliteRoutineInvoker::new(conn).call_procedure(name, args)
        })
    }

    /// Parts supplied by one vendor, via the `get_parts_by_vendor` function.
    pub fn get_parts_by_vendor(&self, vendor_id: VendorId) -> RoutineResult<Vec<Part>> {
        self.call_function(
            "get_parts_by_vendor",
            named_params! { ":vendor_id": vendor_id },
            parse_part_row,
        )
    }

    /// Creates a vendor, a part and their link via the `add_new_part` procedure.
    pub fn add_new_part(&self, part_name: &str, vendor_name: &str) -> RoutineResult<()> {
        self.call_procedure(
            "add_new_part",
            named_params! { ":part_name": part_name, ":vendor_name": vendor_name },
        )
    }

    fn with_connection<T, E>(
        &self,
        event: &'static str,
        operation: impl FnOnce(&mut Connection) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<DbError> + Display,
    {
        let started_at = Instant::now();
        let result = self
            .store
            .connect()
            .map_err(E::from)
            .and_then(|mut conn| operation(&mut conn));

        match &result {
            Ok(_) => debug!(
                "event={event} module=service status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event={event} module=service status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }
}
