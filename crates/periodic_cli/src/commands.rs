use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

use log::info;
use periodic_core::db::DbError;
use periodic_core::repo::catalog_repo::decode_records;
use periodic_core::{
    BlobCatalogRepository, BlobStore, CatalogConfig, CatalogService, CatalogServiceError,
    ConfigError, PatchRequest, RepoError, SqliteBlobStore, StorageError, WritePrecondition,
};
use serde::Serialize;

type Result = std::result::Result<(), CliError>;

/// Failure of one CLI invocation.
#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Logging(String),
    Io(std::io::Error),
    Db(DbError),
    /// Input file is not the expected JSON shape.
    Input(serde_json::Error),
    Render(serde_json::Error),
    Storage(StorageError),
    Catalog(CatalogServiceError),
}

impl CliError {
    /// Short machine-readable classification printed next to the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::Input(_) => "validation",
            Self::Logging(_) => "logging",
            Self::Io(_) | Self::Render(_) => "io",
            Self::Db(_) | Self::Storage(_) => "storage_unavailable",
            Self::Catalog(err) => err.kind().as_str(),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(message) => write!(f, "{message}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Input(err) => write!(f, "invalid input file: {err}"),
            Self::Render(err) => write!(f, "failed to render output: {err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Catalog(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(_) => None,
            Self::Io(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Input(err) => Some(err),
            Self::Render(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Catalog(err) => Some(err),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Catalog(value.into())
    }
}

impl From<StorageError> for CliError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<CatalogServiceError> for CliError {
    fn from(value: CatalogServiceError) -> Self {
        Self::Catalog(value)
    }
}

fn service(
    store: SqliteBlobStore,
    config: &CatalogConfig,
) -> CatalogService<BlobCatalogRepository<SqliteBlobStore>> {
    CatalogService::new(BlobCatalogRepository::from_config(store, config))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result {
    let rendered = serde_json::to_string_pretty(value).map_err(CliError::Render)?;
    println!("{rendered}");
    Ok(())
}

/// `periodic seed <file>`: unconditionally store a JSON catalog.
pub async fn seed(store: SqliteBlobStore, config: &CatalogConfig, file: &Path) -> Result {
    let data = std::fs::read(file)?;
    let records = decode_records(&data)?;

    let etag = store
        .put(
            &config.bucket,
            &config.key,
            data.into(),
            WritePrecondition::None,
        )
        .await?;
    info!(
        "event=catalog_seed module=cli status=ok records={} etag={}",
        records.len(),
        etag
    );

    print_json(&serde_json::json!({
        "bucket": config.bucket,
        "key": config.key,
        "records": records.len(),
        "etag": etag,
    }))
}

/// `periodic list [--group G]`
pub async fn list(store: SqliteBlobStore, config: &CatalogConfig, group: Option<&str>) -> Result {
    let elements = service(store, config).list_all(group).await?;
    print_json(&elements)
}

/// `periodic get <n>`
pub async fn get(store: SqliteBlobStore, config: &CatalogConfig, atomic_number: u32) -> Result {
    let element = service(store, config).get_one(atomic_number).await?;
    print_json(&element)
}

/// `periodic patch <file>`: apply a patch batch with one conditional write.
pub async fn patch(store: SqliteBlobStore, config: &CatalogConfig, file: &Path) -> Result {
    let data = std::fs::read(file)?;
    let patches: Vec<PatchRequest> = serde_json::from_slice(&data).map_err(CliError::Input)?;

    let document = service(store, config).update_batch(patches).await?;
    print_json(&serde_json::json!({
        "etag": document.etag,
        "records": document.records,
    }))
}
