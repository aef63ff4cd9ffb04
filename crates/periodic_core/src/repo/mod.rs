//! Repository layer over the catalog blob.
//!
//! # Responsibility
//! - Isolate blob encoding and conditional-write details from the service.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to store transport errors.

pub mod catalog_repo;
