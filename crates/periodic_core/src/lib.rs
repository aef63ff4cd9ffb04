//! Core catalog logic for the periodic table service.
//! Holds the optimistic-concurrency read-merge-write engine over one JSON
//! document in a blob store.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use config::{CatalogConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::catalog::{CatalogDocument, ElementRecord};
pub use model::element::{Element, PatchRequest};
pub use model::group_block::{parse_group_block, Block, Group, GroupBlock, GroupBlockError};
pub use repo::catalog_repo::{BlobCatalogRepository, CatalogRepository, RepoError, RepoResult};
pub use service::catalog_service::{
    CatalogErrorKind, CatalogService, CatalogServiceError, CatalogValidationError, UpdateStage,
};
pub use service::merge::{merge_patches, MergeError, MergeReport};
pub use storage::{
    BlobStore, MemoryBlobStore, SqliteBlobStore, StorageError, StorageResult, StoredBlob,
    WritePrecondition,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
