//! Detail panel view model for a single resource record.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::timefmt;
use crate::models::ResourceWrapper;

/// One labeled timestamp in the detail panel: absolute text plus, when
/// live-time display is enabled, a parenthetical relative time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimestampField {
    pub label: String,
    pub absolute: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative: Option<String>,
}

/// The identifier triple, rendered monospace by the frontend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierFields {
    pub key: String,
    pub uid: String,
    pub patient_id: String,
}

/// Everything the slide-over detail panel shows for one record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDetail {
    pub resource_type: String,
    /// Version and state labels, e.g. `R4 · COMPLETED`.
    pub subtitle: String,
    pub timestamps: Vec<TimestampField>,
    pub identifiers: IdentifierFields,
    pub narrative: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        timefmt::DASH.to_string()
    } else {
        value.to_string()
    }
}

/// Build the detail view. Purely a projection; the record is untouched.
pub fn build_detail(
    wrapper: &ResourceWrapper,
    live_time: bool,
    now: DateTime<Utc>,
) -> ResourceDetail {
    let meta = &wrapper.resource.metadata;

    let field = |label: &str, text: &str| TimestampField {
        label: label.to_string(),
        absolute: timefmt::format_absolute(text),
        relative: if live_time {
            timefmt::relative_from(text, now)
        } else {
            None
        },
    };

    let mut timestamps = vec![
        field("Created", &meta.created_time),
        field("Fetched", &meta.fetch_time),
    ];
    if let Some(processed) = &meta.processed_time {
        timestamps.push(field("Processed", processed));
    }

    ResourceDetail {
        resource_type: or_dash(&meta.resource_type),
        subtitle: format!("{} · {}", meta.version.label(), meta.state.label()),
        timestamps,
        identifiers: IdentifierFields {
            key: or_dash(&meta.identifier.key),
            uid: or_dash(&meta.identifier.uid),
            patient_id: or_dash(&meta.identifier.patient_id),
        },
        narrative: wrapper.resource.human_readable_str.clone(),
        ai_summary: wrapper.resource.ai_summary.clone(),
    }
}
