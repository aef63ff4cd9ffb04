use bytes::Bytes;
use periodic_core::{
    merge_patches, BlobCatalogRepository, BlobStore, CatalogErrorKind, CatalogRepository,
    CatalogService, CatalogServiceError, PatchRequest, SqliteBlobStore, StorageError,
    WritePrecondition,
};

const BUCKET: &str = "periodic-table";
const KEY: &str = "periodic_table.json";

const SEED: &str = r#"[
    {"name": "Carbon", "atomic_number": 6, "alternative_name": "n/a",
     "group_block": "group 14, p-block"},
    {"name": "Iron", "atomic_number": 26, "alternative_name": "n/a",
     "group_block": "group 8, d-block"}
]"#;

#[tokio::test]
async fn conditional_writes_follow_etag() {
    let store = SqliteBlobStore::open_in_memory().unwrap();

    let first = store
        .put(BUCKET, KEY, Bytes::from_static(b"[]"), WritePrecondition::DoesNotExist)
        .await
        .unwrap();
    assert!(matches!(
        store
            .put(BUCKET, KEY, Bytes::from_static(b"[]"), WritePrecondition::DoesNotExist)
            .await,
        Err(StorageError::PreconditionFailed { expected: None, .. })
    ));

    let second = store
        .put(
            BUCKET,
            KEY,
            Bytes::from_static(SEED.as_bytes()),
            WritePrecondition::MatchesEtag(first.clone()),
        )
        .await
        .unwrap();
    assert_ne!(first, second);

    match store
        .put(
            BUCKET,
            KEY,
            Bytes::from_static(b"[]"),
            WritePrecondition::MatchesEtag(first.clone()),
        )
        .await
    {
        Err(StorageError::PreconditionFailed { expected, .. }) => {
            assert_eq!(expected, Some(first));
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let blob = store.get(BUCKET, KEY).await.unwrap();
    assert_eq!(blob.etag, second);
    assert_eq!(blob.data, Bytes::from_static(SEED.as_bytes()));
}

#[tokio::test]
async fn missing_blob_is_not_found_for_get_and_conditional_put() {
    let store = SqliteBlobStore::open_in_memory().unwrap();

    assert!(matches!(
        store.get(BUCKET, KEY).await,
        Err(StorageError::NotFound { .. })
    ));
    assert!(matches!(
        store
            .put(
                BUCKET,
                KEY,
                Bytes::from_static(b"[]"),
                WritePrecondition::MatchesEtag("\"stale\"".to_string()),
            )
            .await,
        Err(StorageError::NotFound { .. })
    ));
}

#[tokio::test]
async fn delete_removes_blob() {
    let store = SqliteBlobStore::open_in_memory().unwrap();
    store
        .put(BUCKET, KEY, Bytes::from_static(b"[]"), WritePrecondition::None)
        .await
        .unwrap();

    store.delete(BUCKET, KEY).await.unwrap();
    assert!(matches!(
        store.get(BUCKET, KEY).await,
        Err(StorageError::NotFound { .. })
    ));
}

#[tokio::test]
async fn service_update_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.sqlite3");

    {
        let store = SqliteBlobStore::open(&path).unwrap();
        store
            .put(BUCKET, KEY, Bytes::from_static(SEED.as_bytes()), WritePrecondition::None)
            .await
            .unwrap();
        let service = CatalogService::new(BlobCatalogRepository::new(store, BUCKET, KEY));
        service
            .update_batch(vec![PatchRequest::new(26)
                .with_alternative_name("ferrum")
                .with_group_block("group 8, d-block")])
            .await
            .unwrap();
    }

    let service = CatalogService::new(BlobCatalogRepository::new(
        SqliteBlobStore::open(&path).unwrap(),
        BUCKET,
        KEY,
    ));
    let iron = service.get_one(26).await.unwrap();
    assert_eq!(iron.alternative_name, "ferrum");
    assert_eq!(iron.alternative_name_opt(), Some("ferrum"));

    let p_block = service.list_all(Some("p-block")).await.unwrap();
    assert_eq!(p_block.len(), 1);
    assert_eq!(p_block[0].name, "Carbon");
}

#[tokio::test]
async fn two_stores_on_one_file_conflict_on_stale_etag() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.sqlite3");

    let seed_store = SqliteBlobStore::open(&path).unwrap();
    seed_store
        .put(BUCKET, KEY, Bytes::from_static(SEED.as_bytes()), WritePrecondition::None)
        .await
        .unwrap();

    let left = BlobCatalogRepository::new(SqliteBlobStore::open(&path).unwrap(), BUCKET, KEY);
    let right = BlobCatalogRepository::new(SqliteBlobStore::open(&path).unwrap(), BUCKET, KEY);

    let left_doc = left.load().await.unwrap();
    let right_doc = right.load().await.unwrap();

    let left_doc = merge_patches(left_doc, &[PatchRequest::new(6).with_name("Carbon-12")]).unwrap();
    left.save(&left_doc).await.unwrap();

    let right_doc = merge_patches(right_doc, &[PatchRequest::new(6).with_name("Carbon-14")]).unwrap();
    let err = CatalogServiceError::from(right.save(&right_doc).await.unwrap_err());
    assert_eq!(err.kind(), CatalogErrorKind::Conflict);

    let stored = CatalogService::new(left).get_one(6).await.unwrap();
    assert_eq!(stored.name, "Carbon-12");
}
