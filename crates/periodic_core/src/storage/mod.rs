//! Blob store contract used by the catalog repository.
//!
//! # Responsibility
//! - Define opaque get/put/delete over named blobs (`bucket` + `key`).
//! - Carry an opaque version token (`etag`) for conditional writes.
//!
//! # Invariants
//! - `put` with `WritePrecondition::MatchesEtag` never overwrites a blob whose
//!   current etag differs; the mismatch surfaces as
//!   `StorageError::PreconditionFailed`.
//! - Etags are opaque. Callers compare them for equality only.
//! - `delete` is idempotent.

use async_trait::async_trait;
use bytes::Bytes;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryBlobStore;
pub use sqlite::SqliteBlobStore;

pub type StorageResult<T> = Result<T, StorageError>;

/// Precondition attached to a blob write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WritePrecondition {
    /// Write unconditionally. Used for seeding and fixtures.
    None,
    /// Write only when no blob exists under the key.
    DoesNotExist,
    /// Write only when the blob's current etag equals this token.
    MatchesEtag(String),
}

/// Blob payload together with the etag observed at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub data: Bytes,
    pub etag: String,
}

/// Failure reported by a blob store.
#[derive(Debug)]
pub enum StorageError {
    /// No blob under `bucket/key`.
    NotFound { bucket: String, key: String },
    /// The write precondition did not hold; nothing was written.
    PreconditionFailed {
        bucket: String,
        key: String,
        expected: Option<String>,
    },
    /// Backend or transport failure.
    Transport {
        message: String,
        source: Option<Box<dyn Error + Send + Sync + 'static>>,
    },
}

impl StorageError {
    pub fn not_found(bucket: &str, key: &str) -> Self {
        Self::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    pub fn transport_with_source(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { bucket, key } => write!(f, "blob not found: {bucket}/{key}"),
            Self::PreconditionFailed {
                bucket,
                key,
                expected: Some(etag),
            } => write!(
                f,
                "precondition failed for {bucket}/{key}: etag {etag} is no longer current"
            ),
            Self::PreconditionFailed {
                bucket,
                key,
                expected: None,
            } => write!(f, "precondition failed for {bucket}/{key}: blob already exists"),
            Self::Transport {
                message,
                source: Some(source),
            } => write!(f, "{message}: {source}"),
            Self::Transport {
                message,
                source: None,
            } => write!(f, "{message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport {
                source: Some(source),
                ..
            } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Object store client with conditional-write support.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Reads a whole blob with its current etag.
    async fn get(&self, bucket: &str, key: &str) -> StorageResult<StoredBlob>;

    /// Writes a blob under `precondition` and returns the new etag.
    ///
    /// `MatchesEtag` against a missing blob returns `StorageError::NotFound`.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> StorageResult<String>;

    /// Removes a blob. Succeeds when the blob does not exist.
    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()>;
}

#[async_trait]
impl<S: BlobStore + ?Sized> BlobStore for std::sync::Arc<S> {
    async fn get(&self, bucket: &str, key: &str) -> StorageResult<StoredBlob> {
        (**self).get(bucket, key).await
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> StorageResult<String> {
        (**self).put(bucket, key, data, precondition).await
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        (**self).delete(bucket, key).await
    }
}

/// Generates a fresh opaque etag in the quoted form object stores return.
pub(crate) fn new_etag() -> String {
    format!("\"{}\"", uuid::Uuid::new_v4().simple())
}
