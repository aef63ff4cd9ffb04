//! SQLite-backed blob store for local use.
//!
//! # Invariants
//! - Conditional writes are a single `UPDATE ... WHERE etag = ?`, so the
//!   compare-and-set holds across processes sharing the database file.
//! - Every successful write stores a fresh etag.

use super::{new_etag, BlobStore, StorageError, StorageResult, StoredBlob, WritePrecondition};
use crate::db::{open_db, open_db_in_memory, DbError};
use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Blob store persisting each blob as one row of the `blobs` table.
///
/// Calls run rusqlite synchronously on the polling thread while holding the
/// connection mutex; each call is one short statement plus an optional
/// existence check. Sized for the CLI and tests. A host serving many
/// concurrent requests on a tokio runtime should use an object-store
/// backend or move these calls onto `spawn_blocking`.
pub struct SqliteBlobStore {
    conn: Mutex<Connection>,
}

impl SqliteBlobStore {
    /// Opens (or creates) a database file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection that already has migrations applied.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::transport("sqlite blob store lock poisoned"))
    }
}

fn sqlite_error(operation: &str, err: rusqlite::Error) -> StorageError {
    StorageError::transport_with_source(format!("sqlite blob {operation} failed"), err)
}

fn current_etag(conn: &Connection, bucket: &str, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT etag FROM blobs WHERE bucket = ?1 AND key = ?2;",
        params![bucket, key],
        |row| row.get(0),
    )
    .optional()
}

#[async_trait]
impl BlobStore for SqliteBlobStore {
    async fn get(&self, bucket: &str, key: &str) -> StorageResult<StoredBlob> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT content, etag FROM blobs WHERE bucket = ?1 AND key = ?2;",
                params![bucket, key],
                |row| Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(|err| sqlite_error("get", err))?;

        match row {
            Some((content, etag)) => Ok(StoredBlob {
                data: Bytes::from(content),
                etag,
            }),
            None => Err(StorageError::not_found(bucket, key)),
        }
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> StorageResult<String> {
        let conn = self.lock()?;
        let etag = new_etag();
        let content = data.as_ref();

        let changed = match &precondition {
            WritePrecondition::None => conn.execute(
                "INSERT INTO blobs (bucket, key, content, etag) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (bucket, key) DO UPDATE SET
                    content = excluded.content,
                    etag = excluded.etag,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![bucket, key, content, etag],
            ),
            WritePrecondition::DoesNotExist => conn.execute(
                "INSERT OR IGNORE INTO blobs (bucket, key, content, etag) VALUES (?1, ?2, ?3, ?4);",
                params![bucket, key, content, etag],
            ),
            WritePrecondition::MatchesEtag(expected) => conn.execute(
                "UPDATE blobs
                 SET
                    content = ?3,
                    etag = ?4,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE bucket = ?1 AND key = ?2 AND etag = ?5;",
                params![bucket, key, content, etag, expected],
            ),
        }
        .map_err(|err| sqlite_error("put", err))?;

        if changed > 0 {
            return Ok(etag);
        }

        match precondition {
            WritePrecondition::MatchesEtag(expected) => {
                let exists = current_etag(&conn, bucket, key)
                    .map_err(|err| sqlite_error("put", err))?
                    .is_some();
                if exists {
                    Err(StorageError::PreconditionFailed {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                        expected: Some(expected),
                    })
                } else {
                    Err(StorageError::not_found(bucket, key))
                }
            }
            WritePrecondition::DoesNotExist => Err(StorageError::PreconditionFailed {
                bucket: bucket.to_string(),
                key: key.to_string(),
                expected: None,
            }),
            WritePrecondition::None => Err(StorageError::transport(format!(
                "sqlite blob put wrote no row for {bucket}/{key}"
            ))),
        }
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM blobs WHERE bucket = ?1 AND key = ?2;",
            params![bucket, key],
        )
        .map_err(|err| sqlite_error("delete", err))?;
        Ok(())
    }
}
