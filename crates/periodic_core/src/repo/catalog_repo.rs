//! Catalog repository contracts and blob-store implementation.
//!
//! # Responsibility
//! - Load the catalog document with the etag it was read at.
//! - Write documents back conditioned on that etag.
//! - Provide read-only typed projections (`Element`) and group filtering.
//!
//! # Invariants
//! - Writes serialize `ElementRecord` maps, never the narrower `Element`, so
//!   unknown stored fields round-trip verbatim.
//! - A stale etag at write time surfaces as `RepoError::Conflict`; the stored
//!   document is left untouched.
//! - A malformed stored `group_block` fails the whole filter call.

use crate::config::CatalogConfig;
use crate::model::catalog::{CatalogDocument, ElementRecord};
use crate::model::element::Element;
use crate::model::group_block::GroupBlockError;
use crate::storage::{BlobStore, StorageError, WritePrecondition};
use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for catalog persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    /// The catalog blob does not exist.
    NotFound { bucket: String, key: String },
    /// The document changed since it was read.
    Conflict {
        bucket: String,
        key: String,
        etag: String,
    },
    /// Any other store failure.
    Storage(StorageError),
    /// Stored payload is not a JSON array of objects.
    Deserialization(serde_json::Error),
    Serialization(serde_json::Error),
    /// Stored record lacks a field required by the typed projection.
    InvalidRecord { index: usize, message: String },
    /// Stored `group_block` does not parse.
    InvalidGroupBlock {
        atomic_number: u32,
        source: GroupBlockError,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { bucket, key } => write!(f, "catalog not found at {bucket}/{key}"),
            Self::Conflict { bucket, key, etag } => write!(
                f,
                "catalog {bucket}/{key} changed since it was read (stale etag {etag})"
            ),
            Self::Storage(err) => write!(f, "catalog storage failure: {err}"),
            Self::Deserialization(err) => write!(f, "catalog document is not valid: {err}"),
            Self::Serialization(err) => write!(f, "catalog document could not be encoded: {err}"),
            Self::InvalidRecord { index, message } => {
                write!(f, "invalid catalog record at index {index}: {message}")
            }
            Self::InvalidGroupBlock {
                atomic_number,
                source,
            } => write!(
                f,
                "invalid group block on element {atomic_number}: {source}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Deserialization(err) | Self::Serialization(err) => Some(err),
            Self::InvalidGroupBlock { source, .. } => Some(source),
            Self::NotFound { .. } | Self::Conflict { .. } | Self::InvalidRecord { .. } => None,
        }
    }
}

impl From<StorageError> for RepoError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::NotFound { bucket, key } => Self::NotFound { bucket, key },
            StorageError::PreconditionFailed {
                bucket,
                key,
                expected: Some(etag),
            } => Self::Conflict { bucket, key, etag },
            other => Self::Storage(other),
        }
    }
}

/// Repository interface for the catalog document.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Loads the full document together with its current etag.
    async fn load(&self) -> RepoResult<CatalogDocument>;

    /// Writes `document` if the stored etag still equals `document.etag`.
    ///
    /// Returns the new etag.
    async fn save(&self, document: &CatalogDocument) -> RepoResult<String>;

    /// Lists every element in stored order.
    async fn find_all(&self) -> RepoResult<Vec<Element>> {
        let document = self.load().await?;
        records_to_elements(&document.records)
    }

    /// Lists elements whose group (`"1"`..`"18"`, `"n/a"`) or block label
    /// (`"s-block"`...) equals `selector`.
    async fn find_by_group(&self, selector: &str) -> RepoResult<Vec<Element>> {
        let elements = self.find_all().await?;
        filter_by_group(elements, selector)
    }

    /// Gets the first element with `atomic_number`.
    async fn find_by_atomic_number(&self, atomic_number: u32) -> RepoResult<Option<Element>> {
        let elements = self.find_all().await?;
        Ok(elements
            .into_iter()
            .find(|element| element.atomic_number == atomic_number))
    }
}

/// Catalog repository backed by one blob in a `BlobStore`.
pub struct BlobCatalogRepository<S: BlobStore> {
    store: S,
    bucket: String,
    key: String,
}

impl<S: BlobStore> BlobCatalogRepository<S> {
    pub fn new(store: S, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn from_config(store: S, config: &CatalogConfig) -> Self {
        Self::new(store, config.bucket.clone(), config.key.clone())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl<S: BlobStore> CatalogRepository for BlobCatalogRepository<S> {
    async fn load(&self) -> RepoResult<CatalogDocument> {
        let blob = self.store.get(&self.bucket, &self.key).await?;
        let records = decode_records(&blob.data)?;
        debug!(
            "event=catalog_load module=repo status=ok records={} bytes={}",
            records.len(),
            blob.data.len()
        );
        Ok(CatalogDocument::new(records, blob.etag))
    }

    async fn save(&self, document: &CatalogDocument) -> RepoResult<String> {
        let payload = encode_records(&document.records)?;
        let bytes = payload.len();
        let result = self
            .store
            .put(
                &self.bucket,
                &self.key,
                payload,
                WritePrecondition::MatchesEtag(document.etag.clone()),
            )
            .await;

        match result {
            Ok(etag) => {
                debug!(
                    "event=catalog_save module=repo status=ok records={} bytes={bytes}",
                    document.len()
                );
                Ok(etag)
            }
            Err(err) => {
                let err = RepoError::from(err);
                if matches!(err, RepoError::Conflict { .. }) {
                    warn!("event=catalog_save module=repo status=conflict bytes={bytes}");
                }
                Err(err)
            }
        }
    }
}

/// Decodes a stored payload into ordered record maps.
pub fn decode_records(data: &[u8]) -> RepoResult<Vec<ElementRecord>> {
    serde_json::from_slice(data).map_err(RepoError::Deserialization)
}

/// Encodes record maps in the shape they were read in.
pub fn encode_records(records: &[ElementRecord]) -> RepoResult<Bytes> {
    serde_json::to_vec(records)
        .map(Bytes::from)
        .map_err(RepoError::Serialization)
}

/// Projects stored records onto typed `Element` values.
pub fn records_to_elements(records: &[ElementRecord]) -> RepoResult<Vec<Element>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::from_value::<Element>(Value::Object(record.clone())).map_err(|err| {
                RepoError::InvalidRecord {
                    index,
                    message: err.to_string(),
                }
            })
        })
        .collect()
}

/// Keeps elements matching a group token or block label, preserving order.
pub fn filter_by_group(elements: Vec<Element>, selector: &str) -> RepoResult<Vec<Element>> {
    let mut matched = Vec::new();
    for element in elements {
        let parsed =
            element
                .parsed_group_block()
                .map_err(|source| RepoError::InvalidGroupBlock {
                    atomic_number: element.atomic_number,
                    source,
                })?;
        if parsed.group.to_string() == selector || parsed.block.label() == selector {
            matched.push(element);
        }
    }
    Ok(matched)
}
