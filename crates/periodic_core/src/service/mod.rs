//! Catalog use-case services.
//!
//! # Responsibility
//! - Merge patch batches into catalog documents.
//! - Orchestrate repository calls into use-case level APIs.

pub mod catalog_service;
pub mod merge;
