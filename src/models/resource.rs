//! Canonical shape of one EHR resource document.
//!
//! Mirrors the store's wire layout (camelCase fields, wrapper around a
//! `resource` payload with nested `metadata.identifier`). Unknown fields
//! are preserved in flatten maps so documents written by a newer producer
//! survive a round trip through this viewer unchanged.
//!
//! Decoding is total for any JSON object: timestamp fields accept whatever
//! shape the store delivered (see `store::normalize` for the conversion to
//! ISO-8601 text) and enum tags decode leniently.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::enums::{ProcessingState, ResourceVersion};

/// Uniquely addresses one record within its patient. Immutable once created.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceIdentifier {
    pub key: String,
    pub uid: String,
    pub patient_id: String,
}

/// Ingestion/processing metadata attached to every record.
///
/// `created_time` and `fetch_time` are always present on well-formed
/// documents; `processed_time` appears only once processing has completed
/// or failed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceMetadata {
    pub state: ProcessingState,
    #[serde(deserialize_with = "lenient_text")]
    pub created_time: String,
    #[serde(deserialize_with = "lenient_text")]
    pub fetch_time: String,
    #[serde(
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub processed_time: Option<String>,
    pub identifier: ResourceIdentifier,
    pub resource_type: String,
    pub version: ResourceVersion,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The displayable unit: narrative text plus optional AI summary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceRecord {
    pub metadata: ResourceMetadata,
    pub human_readable_str: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A store document: store-assigned `id` plus the record payload.
///
/// `id` is absent for client-synthesized (demo) rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceWrapper {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub resource: ResourceRecord,
}

impl ResourceWrapper {
    /// Stable key used by the UI to address this row (detail lookup).
    ///
    /// The store id is unique per document; `identifier.key` is only a
    /// fallback for demo rows, which carry no store id.
    pub fn row_key(&self) -> &str {
        match &self.id {
            Some(id) => id,
            None => &self.resource.metadata.identifier.key,
        }
    }
}

/// Render any JSON value to text: strings pass through, null becomes empty,
/// anything else keeps its literal JSON rendering so no data is dropped.
pub(crate) fn value_to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(value))
}

fn lenient_opt_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
