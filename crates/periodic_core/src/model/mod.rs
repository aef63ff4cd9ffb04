//! Catalog domain model.
//!
//! # Responsibility
//! - Typed `Element` projections and `PatchRequest` inputs.
//! - Loosely typed stored records (`ElementRecord`) and the versioned
//!   `CatalogDocument`.
//! - Group/block classification parsing.

pub mod catalog;
pub mod element;
pub mod group_block;
