//! Catalog use-case service.
//!
//! # Responsibility
//! - Validate caller input before any storage access.
//! - Run one load -> merge -> conditional save cycle per patch batch.
//! - Map repository failures onto the catalog error taxonomy.
//!
//! # Invariants
//! - A batch is written completely or not at all.
//! - Conflicts are returned as-is; this service never retries.
//! - No state is kept between calls.

use crate::logging::{sanitize_for_log, MAX_LOGGED_VALUE_CHARS};
use crate::model::catalog::CatalogDocument;
use crate::model::element::{Element, PatchRequest};
use crate::model::group_block::{
    parse_block_label, parse_group_block, parse_group_token, GroupBlockError,
};
use crate::repo::catalog_repo::{CatalogRepository, RepoError};
use crate::service::merge::{merge_patches_with_report, MergeError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Steps of one update cycle, reported when a cycle fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStage {
    Loading,
    Merging,
    Saving,
    Done,
}

impl UpdateStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Merging => "merging",
            Self::Saving => "saving",
            Self::Done => "done",
        }
    }
}

/// Rejected caller input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogValidationError {
    /// The batch has no entries.
    EmptyBatch,
    /// Every entry in the batch is empty.
    NoEffectivePatch,
    /// Entry `index` has atomic number zero.
    InvalidAtomicNumber { index: usize },
    /// A patch carries a `group_block` that does not parse.
    InvalidGroupBlock {
        atomic_number: u32,
        source: GroupBlockError,
    },
    /// List filter is neither a group token nor a block label.
    InvalidGroupSelector(String),
}

impl Display for CatalogValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyBatch => write!(f, "at least one element is required"),
            Self::NoEffectivePatch => {
                write!(f, "each element must set at least one field to update")
            }
            Self::InvalidAtomicNumber { index } => {
                write!(f, "element at index {index}: atomic number must be positive")
            }
            Self::InvalidGroupBlock {
                atomic_number,
                source,
            } => write!(f, "element {atomic_number}: {source}"),
            Self::InvalidGroupSelector(value) => write!(
                f,
                "invalid group filter `{value}`; expected 1-18, n/a or <s|p|d|f|g>-block"
            ),
        }
    }
}

impl Error for CatalogValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidGroupBlock { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Flat classification of service errors for transport layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogErrorKind {
    NotFound,
    Validation,
    Conflict,
    Deserialization,
    StorageUnavailable,
    InvalidData,
}

impl CatalogErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::Deserialization => "deserialization",
            Self::StorageUnavailable => "storage_unavailable",
            Self::InvalidData => "invalid_data",
        }
    }
}

/// Service error for catalog use-cases.
#[derive(Debug)]
pub enum CatalogServiceError {
    ElementNotFound(u32),
    CatalogNotFound { bucket: String, key: String },
    Validation(CatalogValidationError),
    /// The catalog changed between load and save; the caller may retry.
    Conflict(RepoError),
    Deserialization(RepoError),
    StorageUnavailable(RepoError),
    /// Stored records are unreadable by the typed projection.
    InvalidData(RepoError),
    Merge(MergeError),
}

impl CatalogServiceError {
    pub fn kind(&self) -> CatalogErrorKind {
        match self {
            Self::ElementNotFound(_) | Self::CatalogNotFound { .. } => CatalogErrorKind::NotFound,
            Self::Validation(_) => CatalogErrorKind::Validation,
            Self::Conflict(_) => CatalogErrorKind::Conflict,
            Self::Deserialization(_) => CatalogErrorKind::Deserialization,
            Self::StorageUnavailable(_) => CatalogErrorKind::StorageUnavailable,
            Self::InvalidData(_) | Self::Merge(_) => CatalogErrorKind::InvalidData,
        }
    }
}

impl Display for CatalogServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ElementNotFound(atomic_number) => {
                write!(f, "element not found for atomic number: {atomic_number}")
            }
            Self::CatalogNotFound { bucket, key } => {
                write!(f, "catalog not found at {bucket}/{key}")
            }
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::Conflict(err)
            | Self::Deserialization(err)
            | Self::StorageUnavailable(err)
            | Self::InvalidData(err) => write!(f, "{err}"),
            Self::Merge(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ElementNotFound(_) | Self::CatalogNotFound { .. } => None,
            Self::Validation(err) => Some(err),
            Self::Conflict(err)
            | Self::Deserialization(err)
            | Self::StorageUnavailable(err)
            | Self::InvalidData(err) => Some(err),
            Self::Merge(err) => Some(err),
        }
    }
}

impl From<RepoError> for CatalogServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { bucket, key } => Self::CatalogNotFound { bucket, key },
            err @ RepoError::Conflict { .. } => Self::Conflict(err),
            err @ RepoError::Deserialization(_) => Self::Deserialization(err),
            err @ RepoError::Storage(_) => Self::StorageUnavailable(err),
            err @ (RepoError::Serialization(_)
            | RepoError::InvalidRecord { .. }
            | RepoError::InvalidGroupBlock { .. }) => Self::InvalidData(err),
        }
    }
}

impl From<CatalogValidationError> for CatalogServiceError {
    fn from(value: CatalogValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<MergeError> for CatalogServiceError {
    fn from(value: MergeError) -> Self {
        Self::Merge(value)
    }
}

/// Catalog service facade over repository implementations.
pub struct CatalogService<R: CatalogRepository> {
    repo: R,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Lists elements, optionally filtered by group number, `n/a`, or block
    /// label. A blank filter lists everything.
    pub async fn list_all(
        &self,
        group_filter: Option<&str>,
    ) -> Result<Vec<Element>, CatalogServiceError> {
        let selector = group_filter
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(normalize_group_selector)
            .transpose()?;

        let elements = match selector.as_deref() {
            Some(selector) => self.repo.find_by_group(selector).await?,
            None => self.repo.find_all().await?,
        };
        Ok(elements)
    }

    /// Gets one element by atomic number.
    pub async fn get_one(&self, atomic_number: u32) -> Result<Element, CatalogServiceError> {
        self.repo
            .find_by_atomic_number(atomic_number)
            .await?
            .ok_or(CatalogServiceError::ElementNotFound(atomic_number))
    }

    /// Applies a patch batch with one load -> merge -> conditional save cycle.
    ///
    /// Returns the merged document carrying the etag of the new revision.
    /// Patches whose atomic number matches no element are dropped, and the
    /// document is still written back.
    ///
    /// # Errors
    /// - `Validation` when the batch is empty, only has empty patches, or
    ///   carries an invalid atomic number or `group_block`.
    /// - `Conflict` when the catalog changed after it was loaded.
    pub async fn update_batch(
        &self,
        patches: Vec<PatchRequest>,
    ) -> Result<CatalogDocument, CatalogServiceError> {
        let patches = match validate_patch_batch(patches) {
            Ok(patches) => patches,
            Err(err) => {
                warn!(
                    "event=catalog_update module=service status=rejected error_kind=validation error={}",
                    err
                );
                return Err(err.into());
            }
        };

        let started_at = Instant::now();
        info!(
            "event=catalog_update module=service status=start patches={}",
            patches.len()
        );

        let mut stage = UpdateStage::Loading;
        match self.run_update(&patches, &mut stage).await {
            Ok(document) => {
                info!(
                    "event=catalog_update module=service status=ok stage={} records={} duration_ms={}",
                    stage.as_str(),
                    document.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(document)
            }
            Err(err) => {
                let kind = err.kind();
                if kind == CatalogErrorKind::Conflict {
                    warn!(
                        "event=catalog_update module=service status=error stage={} error_kind={} duration_ms={}",
                        stage.as_str(),
                        kind.as_str(),
                        started_at.elapsed().as_millis()
                    );
                } else {
                    error!(
                        "event=catalog_update module=service status=error stage={} error_kind={} duration_ms={} error={}",
                        stage.as_str(),
                        kind.as_str(),
                        started_at.elapsed().as_millis(),
                        err
                    );
                }
                Err(err)
            }
        }
    }

    async fn run_update(
        &self,
        patches: &[PatchRequest],
        stage: &mut UpdateStage,
    ) -> Result<CatalogDocument, CatalogServiceError> {
        *stage = UpdateStage::Loading;
        let current = self.repo.load().await?;

        *stage = UpdateStage::Merging;
        let (mut merged, report) = merge_patches_with_report(current, patches)?;
        if !report.unmatched.is_empty() {
            info!(
                "event=catalog_merge module=service status=ok patched={} unmatched={:?}",
                report.patched.len(),
                report.unmatched
            );
        }

        *stage = UpdateStage::Saving;
        merged.etag = self.repo.save(&merged).await?;

        *stage = UpdateStage::Done;
        Ok(merged)
    }
}

/// Validates a patch batch and drops empty patches.
///
/// Runs before any storage access, so rejected batches never reach the
/// merge engine.
pub fn validate_patch_batch(
    patches: Vec<PatchRequest>,
) -> Result<Vec<PatchRequest>, CatalogValidationError> {
    if patches.is_empty() {
        return Err(CatalogValidationError::EmptyBatch);
    }

    for (index, patch) in patches.iter().enumerate() {
        if patch.atomic_number == 0 {
            return Err(CatalogValidationError::InvalidAtomicNumber { index });
        }
        if let Some(group_block) = patch.effective_group_block() {
            parse_group_block(group_block).map_err(|source| {
                CatalogValidationError::InvalidGroupBlock {
                    atomic_number: patch.atomic_number,
                    source,
                }
            })?;
        }
    }

    let effective: Vec<PatchRequest> = patches
        .into_iter()
        .filter(|patch| !patch.is_empty())
        .collect();
    if effective.is_empty() {
        return Err(CatalogValidationError::NoEffectivePatch);
    }
    Ok(effective)
}

/// Normalizes a list filter to the form `find_by_group` compares against.
pub fn normalize_group_selector(raw: &str) -> Result<String, CatalogValidationError> {
    let value = raw.trim().to_ascii_lowercase();
    if let Ok(group) = parse_group_token(&value) {
        return Ok(group.to_string());
    }
    if let Ok(block) = parse_block_label(&value) {
        return Ok(block.label());
    }
    Err(CatalogValidationError::InvalidGroupSelector(
        sanitize_for_log(raw, MAX_LOGGED_VALUE_CHARS),
    ))
}
