//! Catalog location configuration.
//!
//! # Responsibility
//! - Resolve which blob (`bucket` + `key`) holds the catalog document.
//! - Resolve the optional local SQLite blob store path.
//!
//! # Invariants
//! - Bucket and key are trimmed, non-empty and free of control characters.
//! - Keys are relative; a leading `/` is rejected.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_BUCKET: &str = "PERIODIC_TABLE_BUCKET";
pub const ENV_KEY: &str = "PERIODIC_TABLE_KEY";
pub const ENV_DB_PATH: &str = "PERIODIC_TABLE_DB";

pub const DEFAULT_BUCKET: &str = "periodic-table";
pub const DEFAULT_KEY: &str = "periodic_table.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Empty { name: &'static str },
    InvalidValue {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty { name } => write!(f, "{name} cannot be empty"),
            Self::InvalidValue {
                name,
                value,
                reason,
            } => write!(f, "invalid {name} `{value}`: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// Where the catalog document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub bucket: String,
    pub key: String,
    /// Local SQLite blob store file; `None` means the caller picks a store.
    pub db_path: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            key: DEFAULT_KEY.to_string(),
            db_path: None,
        }
    }
}

impl CatalogConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults for unset
    /// variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(bucket) = lookup(ENV_BUCKET) {
            config = config.with_bucket(&bucket)?;
        }
        if let Some(key) = lookup(ENV_KEY) {
            config = config.with_key(&key)?;
        }
        if let Some(path) = lookup(ENV_DB_PATH) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                config.db_path = Some(PathBuf::from(trimmed));
            }
        }
        Ok(config)
    }

    pub fn with_bucket(mut self, bucket: &str) -> Result<Self, ConfigError> {
        self.bucket = normalize_name(ENV_BUCKET, bucket)?;
        Ok(self)
    }

    pub fn with_key(mut self, key: &str) -> Result<Self, ConfigError> {
        let key = normalize_name(ENV_KEY, key)?;
        if key.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                name: ENV_KEY,
                value: key,
                reason: "object keys are relative and must not start with `/`",
            });
        }
        self.key = key;
        Ok(self)
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }
}

fn normalize_name(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty { name });
    }
    if trimmed.chars().any(char::is_control) {
        return Err(ConfigError::InvalidValue {
            name,
            value: trimmed.escape_debug().to_string(),
            reason: "control characters are not allowed",
        });
    }
    Ok(trimmed.to_string())
}
