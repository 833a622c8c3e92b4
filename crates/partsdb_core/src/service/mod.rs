//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own connection scoping: one connection per operation.

pub mod catalog_service;
