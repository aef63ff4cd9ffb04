use periodic_core::db::migrations::latest_version;
use periodic_core::db::{open_db, open_db_in_memory, DbError};
use periodic_core::SqliteBlobStore;
use rusqlite::Connection;

#[test]
fn open_db_in_memory_creates_blob_table() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_eq!(
        column_names(&conn, "blobs"),
        ["bucket", "key", "content", "etag", "updated_at"]
    );
}

#[test]
fn reopening_file_database_keeps_schema_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.sqlite3");

    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO blobs (bucket, key, content, etag) VALUES ('b', 'k', x'5b5d', '\"e1\"');",
        [],
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let etag: String = conn
        .query_row(
            "SELECT etag FROM blobs WHERE bucket = 'b' AND key = 'k';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(etag, "\"e1\"");
}

#[test]
fn newer_schema_version_is_rejected_by_db_and_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(matches!(
        SqliteBlobStore::open(&path),
        Err(DbError::UnsupportedSchemaVersion { .. })
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn column_names(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table});"))
        .unwrap();
    stmt.query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}
