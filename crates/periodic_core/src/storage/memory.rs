//! In-memory blob store for tests and fixtures.

use super::{new_etag, BlobStore, StorageError, StorageResult, StoredBlob, WritePrecondition};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;

/// Thread-safe in-memory blob store.
///
/// Every successful write assigns a new random etag, matching how object
/// stores treat content revisions.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<(String, String), StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StorageError {
        StorageError::transport("memory blob store lock poisoned")
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, bucket: &str, key: &str) -> StorageResult<StoredBlob> {
        let objects = self.objects.read().map_err(|_| Self::poisoned())?;
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::not_found(bucket, key))
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> StorageResult<String> {
        let mut objects = self.objects.write().map_err(|_| Self::poisoned())?;
        let slot = (bucket.to_string(), key.to_string());

        match (&precondition, objects.get(&slot)) {
            (WritePrecondition::None, _) => {}
            (WritePrecondition::DoesNotExist, None) => {}
            (WritePrecondition::DoesNotExist, Some(_)) => {
                return Err(StorageError::PreconditionFailed {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    expected: None,
                });
            }
            (WritePrecondition::MatchesEtag(_), None) => {
                return Err(StorageError::not_found(bucket, key));
            }
            (WritePrecondition::MatchesEtag(expected), Some(current)) => {
                if current.etag != *expected {
                    return Err(StorageError::PreconditionFailed {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                        expected: Some(expected.clone()),
                    });
                }
            }
        }

        let etag = new_etag();
        objects.insert(
            slot,
            StoredBlob {
                data,
                etag: etag.clone(),
            },
        );
        Ok(etag)
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.objects
            .write()
            .map_err(|_| Self::poisoned())?
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}
