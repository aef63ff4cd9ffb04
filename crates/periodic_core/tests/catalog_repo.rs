use bytes::Bytes;
use periodic_core::service::merge::merge_patches;
use periodic_core::{
    BlobCatalogRepository, BlobStore, CatalogRepository, CatalogService, MemoryBlobStore,
    PatchRequest, RepoError, WritePrecondition,
};
use serde_json::Value;

const BUCKET: &str = "periodic-table";
const KEY: &str = "periodic_table.json";

const THREE_ELEMENTS: &str = r#"[
    {"name": "Hydrogen", "atomic_number": 1, "alternative_name": "n/a",
     "group_block": "group 1, s-block"},
    {"name": "Helium", "atomic_number": 2, "alternative_name": "n/a",
     "group_block": "group 18 (noble gases), s-block"},
    {"name": "Lithium", "atomic_number": 3, "alternative_name": "n/a",
     "group_block": "group 1, s-block", "melting_point_k": 453.65}
]"#;

async fn seeded_repo(payload: &str) -> BlobCatalogRepository<MemoryBlobStore> {
    let store = MemoryBlobStore::new();
    store
        .put(
            BUCKET,
            KEY,
            Bytes::copy_from_slice(payload.as_bytes()),
            WritePrecondition::None,
        )
        .await
        .unwrap();
    BlobCatalogRepository::new(store, BUCKET, KEY)
}

async fn stored_json(repo: &BlobCatalogRepository<MemoryBlobStore>) -> Value {
    let blob = repo.store().get(BUCKET, KEY).await.unwrap();
    serde_json::from_slice(&blob.data).unwrap()
}

#[tokio::test]
async fn find_all_projects_every_record_in_order() {
    let repo = seeded_repo(THREE_ELEMENTS).await;

    let elements = repo.find_all().await.unwrap();
    let names: Vec<&str> = elements.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["Hydrogen", "Helium", "Lithium"]);
    assert_eq!(elements[1].group_block, "group 18 (noble gases), s-block");
}

#[tokio::test]
async fn find_all_on_empty_array_returns_empty() {
    let repo = seeded_repo("[]").await;
    assert!(repo.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn load_of_invalid_json_is_deserialization_error() {
    let repo = seeded_repo("{ invalid json }").await;
    assert!(matches!(
        repo.load().await,
        Err(RepoError::Deserialization(_))
    ));
}

#[tokio::test]
async fn load_of_missing_blob_is_not_found() {
    let repo = BlobCatalogRepository::new(MemoryBlobStore::new(), BUCKET, KEY);
    match repo.load().await {
        Err(RepoError::NotFound { bucket, key }) => {
            assert_eq!(bucket, BUCKET);
            assert_eq!(key, KEY);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn find_by_group_keeps_matching_elements_in_order() {
    let repo = seeded_repo(THREE_ELEMENTS).await;

    let group_one = repo.find_by_group("1").await.unwrap();
    let names: Vec<&str> = group_one.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["Hydrogen", "Lithium"]);

    let s_block = repo.find_by_group("s-block").await.unwrap();
    assert_eq!(s_block.len(), 3);
}

#[tokio::test]
async fn find_by_group_fails_on_any_malformed_group_block() {
    let repo = seeded_repo(
        r#"[{"name": "Hydrogen", "atomic_number": 1, "alternative_name": "n/a",
             "group_block": "group 1, s-block"},
            {"name": "Oddium", "atomic_number": 200, "alternative_name": "n/a",
             "group_block": "row 9"}]"#,
    )
    .await;

    assert!(matches!(
        repo.find_by_group("1").await,
        Err(RepoError::InvalidGroupBlock {
            atomic_number: 200,
            ..
        })
    ));
}

#[tokio::test]
async fn find_by_atomic_number_returns_match_or_none() {
    let repo = seeded_repo(THREE_ELEMENTS).await;

    let helium = repo.find_by_atomic_number(2).await.unwrap().unwrap();
    assert_eq!(helium.name, "Helium");
    assert!(repo.find_by_atomic_number(118).await.unwrap().is_none());
}

#[tokio::test]
async fn save_round_trips_unknown_fields() {
    let repo = seeded_repo(THREE_ELEMENTS).await;
    let document = repo.load().await.unwrap();
    let before_etag = document.etag.clone();

    let merged = merge_patches(document, &[PatchRequest::new(3).with_name("Lithium-7")]).unwrap();
    let new_etag = repo.save(&merged).await.unwrap();
    assert_ne!(new_etag, before_etag);

    let stored = stored_json(&repo).await;
    assert_eq!(stored[2]["name"], "Lithium-7");
    assert_eq!(stored[2]["melting_point_k"], 453.65);
    assert_eq!(repo.load().await.unwrap().etag, new_etag);
}

#[tokio::test]
async fn save_with_stale_etag_conflicts_and_keeps_stored_document() {
    let repo = seeded_repo(THREE_ELEMENTS).await;
    let first = repo.load().await.unwrap();
    let second = repo.load().await.unwrap();
    assert_eq!(first.etag, second.etag);

    let winner = merge_patches(first, &[PatchRequest::new(1).with_name("Protium")]).unwrap();
    repo.save(&winner).await.unwrap();

    let loser = merge_patches(second, &[PatchRequest::new(1).with_name("Deuterium")]).unwrap();
    assert!(matches!(
        repo.save(&loser).await,
        Err(RepoError::Conflict { .. })
    ));

    let current = repo.load().await.unwrap();
    assert_eq!(current.records, winner.records);
}

#[tokio::test]
async fn numeric_string_atomic_number_is_readable_and_patchable() {
    let repo = seeded_repo(
        r#"[{"name": "Iron", "atomic_number": "26", "alternative_name": "n/a",
             "group_block": "group 8, d-block"},
            {"name": "Cobalt", "atomic_number": 27, "alternative_name": "n/a",
             "group_block": "group 9, d-block"}]"#,
    )
    .await;

    let elements = repo.find_all().await.unwrap();
    assert_eq!(elements[0].atomic_number, 26);
    assert_eq!(repo.find_by_group("8").await.unwrap()[0].name, "Iron");
    assert_eq!(
        repo.find_by_atomic_number(26).await.unwrap().unwrap().name,
        "Iron"
    );

    let service = CatalogService::new(repo);
    service
        .update_batch(vec![PatchRequest::new(26).with_name("Ferrum")])
        .await
        .unwrap();
    assert_eq!(service.get_one(26).await.unwrap().name, "Ferrum");
    assert_eq!(service.list_all(None).await.unwrap().len(), 2);

    let stored = stored_json(service.repository()).await;
    assert_eq!(stored[0]["atomic_number"], "26");
}

#[tokio::test]
async fn padded_string_atomic_number_is_invalid_record() {
    let repo = seeded_repo(
        r#"[{"name": "Iron", "atomic_number": " 26 ", "alternative_name": "n/a",
             "group_block": "group 8, d-block"}]"#,
    )
    .await;

    assert!(matches!(
        repo.find_all().await,
        Err(RepoError::InvalidRecord { index: 0, .. })
    ));
}
