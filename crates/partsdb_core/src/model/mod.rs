//! Typed records for the parts catalog.
//!
//! # Responsibility
//! - Define one record type per persisted entity.
//! - Own input validation rules shared by every write path.
//!
//! # Invariants
//! - Record field names equal the column names of the backing tables, so a
//!   file-backed mirror can serialize the same shapes.
//! - Generated ids are assigned by the store and never rewritten by core.

pub mod catalog;
