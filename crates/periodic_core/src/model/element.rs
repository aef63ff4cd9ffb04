//! Typed element view and patch request model.
//!
//! # Invariants
//! - `atomic_number` identifies an element and is never changed by a patch.
//! - `alternative_name == "n/a"` means the element has no alternative name.
//! - A patch is empty iff `name`, `alternative_name` and `group_block` are all
//!   unset or blank.

use crate::model::catalog::atomic_number_from_value;
use crate::model::group_block::{parse_group_block, GroupBlock, GroupBlockError};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

const NO_ALTERNATIVE_NAME: &str = "n/a";

/// Typed projection of one catalog record.
///
/// Unknown fields on the stored record are ignored on deserialization; they
/// survive writes because writes go through `ElementRecord`, not this type.
/// `atomic_number` is read like the merge engine reads it, so an integer or a
/// string of digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    #[serde(deserialize_with = "deserialize_atomic_number")]
    pub atomic_number: u32,
    pub alternative_name: String,
    pub group_block: String,
}

impl Element {
    /// Returns the alternative name, or `None` for the `n/a` sentinel.
    pub fn alternative_name_opt(&self) -> Option<&str> {
        let value = self.alternative_name.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(NO_ALTERNATIVE_NAME) {
            None
        } else {
            Some(self.alternative_name.as_str())
        }
    }

    pub fn parsed_group_block(&self) -> Result<GroupBlock, GroupBlockError> {
        parse_group_block(&self.group_block)
    }
}

fn deserialize_atomic_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    atomic_number_from_value(&value).ok_or_else(|| {
        D::Error::custom(format!(
            "atomic_number must be a positive integer or a string of digits, got {value}"
        ))
    })
}

/// Partial update for one element, keyed by atomic number.
///
/// Accepts camelCase keys (the public API shape) and snake_case aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchRequest {
    #[serde(alias = "atomic_number")]
    pub atomic_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        alias = "alternative_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub alternative_name: Option<String>,
    #[serde(default, alias = "group_block", skip_serializing_if = "Option::is_none")]
    pub group_block: Option<String>,
}

impl PatchRequest {
    pub fn new(atomic_number: u32) -> Self {
        Self {
            atomic_number,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_alternative_name(mut self, alternative_name: impl Into<String>) -> Self {
        self.alternative_name = Some(alternative_name.into());
        self
    }

    pub fn with_group_block(mut self, group_block: impl Into<String>) -> Self {
        self.group_block = Some(group_block.into());
        self
    }

    /// `name` when present and not blank.
    pub fn effective_name(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }

    /// `alternative_name` when present and not blank.
    pub fn effective_alternative_name(&self) -> Option<&str> {
        non_blank(self.alternative_name.as_deref())
    }

    /// `group_block` when present and not blank.
    pub fn effective_group_block(&self) -> Option<&str> {
        non_blank(self.group_block.as_deref())
    }

    /// True when the patch would not change any field.
    pub fn is_empty(&self) -> bool {
        self.effective_name().is_none()
            && self.effective_alternative_name().is_none()
            && self.effective_group_block().is_none()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{Element, PatchRequest};

    fn hydrogen() -> Element {
        Element {
            name: "Hydrogen".to_string(),
            atomic_number: 1,
            alternative_name: "n/a".to_string(),
            group_block: "group 1, s-block".to_string(),
        }
    }

    #[test]
    fn alternative_name_sentinel_maps_to_none() {
        assert_eq!(hydrogen().alternative_name_opt(), None);

        let mut aluminium = hydrogen();
        aluminium.alternative_name = "aluminum".to_string();
        assert_eq!(aluminium.alternative_name_opt(), Some("aluminum"));
    }

    #[test]
    fn patch_is_empty_only_when_all_fields_blank() {
        assert!(PatchRequest::new(1).is_empty());
        assert!(PatchRequest::new(1)
            .with_name("  ")
            .with_alternative_name("")
            .with_group_block("\t")
            .is_empty());
        assert!(!PatchRequest::new(1).with_alternative_name("H").is_empty());
    }

    #[test]
    fn patch_accepts_camel_and_snake_case_keys() {
        let camel: PatchRequest =
            serde_json::from_str(r#"{"atomicNumber": 3, "alternativeName": "Li"}"#).unwrap();
        let snake: PatchRequest =
            serde_json::from_str(r#"{"atomic_number": 3, "alternative_name": "Li"}"#).unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.effective_alternative_name(), Some("Li"));
        assert_eq!(camel.name, None);
    }

    #[test]
    fn element_ignores_unknown_fields() {
        let element: Element = serde_json::from_str(
            r#"{"name":"Helium","atomic_number":2,"alternative_name":"n/a",
                "group_block":"group 18 (noble gases), s-block","density":0.1786}"#,
        )
        .unwrap();
        assert_eq!(element.atomic_number, 2);
        assert_eq!(element.parsed_group_block().unwrap().group.to_string(), "18");
    }

    #[test]
    fn element_reads_numeric_string_atomic_number() {
        let element: Element = serde_json::from_str(
            r#"{"name":"Iron","atomic_number":"26","alternative_name":"n/a",
                "group_block":"group 8, d-block"}"#,
        )
        .unwrap();
        assert_eq!(element.atomic_number, 26);
        assert_eq!(serde_json::to_value(&element).unwrap()["atomic_number"], 26);

        for bad in [r#"" 26""#, r#""iron""#, "0", "-1", "true"] {
            let json = format!(
                r#"{{"name":"x","atomic_number":{bad},"alternative_name":"n/a","group_block":"group 8, d-block"}}"#
            );
            assert!(serde_json::from_str::<Element>(&json).is_err(), "{bad}");
        }
    }
}
