//! Transactional data-access core for the parts catalog.
//! This crate is the single source of truth for catalog invariants:
//! vendors, parts, part drawings and vendor-part supply links.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod routine;
pub mod service;

pub use config::{ConfigError, StoreConfig, StoreLocation};
pub use db::{DbError, DbResult, Store};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::catalog::{
    EntityKind, Part, PartDrawing, PartId, ValidationError, Vendor, VendorId, VendorPart,
};
pub use repo::link_repo::{RelationshipWriter, SqliteRelationshipWriter};
pub use repo::part_repo::{PartRepository, SqlitePartRepository};
pub use repo::report_repo::{AggregationReader, PartWithVendors, SqliteAggregationReader};
pub use repo::vendor_repo::{SqliteVendorRepository, VendorRepository};
pub use repo::{RepoError, RepoResult};
pub use routine::invoker::{RoutineArgs, SqliteRoutineInvoker};
pub use routine::registry::{RoutineRegistry, SqliteRoutineRegistry};
pub use routine::source::{BuiltinRoutineSource, DirRoutineSource, RoutineSource};
pub use routine::{RoutineDefinition, RoutineError, RoutineKind, RoutineResult};
pub use service::catalog_service::CatalogService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
