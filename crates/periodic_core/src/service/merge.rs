//! Field-level merge of patch batches into a catalog document.
//!
//! # Invariants
//! - For each record the *first* patch in input order with a matching atomic
//!   number applies; later duplicates are ignored.
//! - Records without a matching patch move through untouched.
//! - Only present, non-blank patch fields overwrite; values are stored
//!   verbatim. `atomic_number` is never written.
//! - Patches that match no record are dropped; the merge never inserts.
//! - The document etag passes through unchanged.

use crate::model::catalog::{
    record_atomic_number, CatalogDocument, ElementRecord, FIELD_ALTERNATIVE_NAME,
    FIELD_GROUP_BLOCK, FIELD_NAME,
};
use crate::model::element::PatchRequest;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// A stored record has no usable `atomic_number`.
    InvalidRecord { index: usize },
}

impl Display for MergeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRecord { index } => write!(
                f,
                "catalog record at index {index} has no valid atomic_number"
            ),
        }
    }
}

impl Error for MergeError {}

/// Outcome details of one merge, used for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Atomic numbers of records that received a patch, in document order.
    pub patched: Vec<u32>,
    /// Atomic numbers of patches that matched no record, ascending.
    pub unmatched: Vec<u32>,
}

/// Applies `patches` to `document`.
pub fn merge_patches(
    document: CatalogDocument,
    patches: &[PatchRequest],
) -> Result<CatalogDocument, MergeError> {
    merge_patches_with_report(document, patches).map(|(document, _)| document)
}

/// Applies `patches` to `document` and reports which patches landed.
pub fn merge_patches_with_report(
    document: CatalogDocument,
    patches: &[PatchRequest],
) -> Result<(CatalogDocument, MergeReport), MergeError> {
    let mut lookup: HashMap<u32, &PatchRequest> = HashMap::with_capacity(patches.len());
    for patch in patches {
        lookup.entry(patch.atomic_number).or_insert(patch);
    }

    let CatalogDocument { records, etag } = document;
    let mut report = MergeReport::default();
    let mut merged = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        let atomic_number =
            record_atomic_number(&record).ok_or(MergeError::InvalidRecord { index })?;
        match lookup.get(&atomic_number) {
            Some(patch) => {
                merged.push(apply_patch(record, patch));
                report.patched.push(atomic_number);
            }
            None => merged.push(record),
        }
    }

    let patched: BTreeSet<u32> = report.patched.iter().copied().collect();
    report.unmatched = lookup
        .keys()
        .copied()
        .filter(|atomic_number| !patched.contains(atomic_number))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    Ok((CatalogDocument::new(merged, etag), report))
}

fn apply_patch(mut record: ElementRecord, patch: &PatchRequest) -> ElementRecord {
    let fields = [
        (FIELD_NAME, patch.effective_name()),
        (FIELD_ALTERNATIVE_NAME, patch.effective_alternative_name()),
        (FIELD_GROUP_BLOCK, patch.effective_group_block()),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            record.insert(field.to_string(), Value::String(value.to_string()));
        }
    }
    record
}
