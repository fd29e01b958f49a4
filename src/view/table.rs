//! Table view models: columns, rendered rows, search, sort, pagination.
//!
//! Column behavior lives in one descriptor table rather than scattered
//! conditionals; the frontend renders headers and sort affordances from
//! the same descriptors the backend sorts by. Rows arrive fully rendered:
//! the webview never touches raw metadata.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timefmt;
use crate::models::{BadgeEmphasis, ResourceWrapper};

/// Fixed page size; the UI exposes no page-size control.
pub const PAGE_SIZE: usize = 10;

// ---------------------------------------------------------------------------
// Column descriptors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnId {
    ResourceType,
    Patient,
    Created,
    Fetched,
    State,
    Details,
}

/// One column of the resource table.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSpec {
    pub id: ColumnId,
    pub label: &'static str,
    pub sortable: bool,
}

/// The six columns, in display order.
pub const COLUMNS: [ColumnSpec; 6] = [
    ColumnSpec { id: ColumnId::ResourceType, label: "Resource Type", sortable: true },
    ColumnSpec { id: ColumnId::Patient, label: "Patient", sortable: true },
    ColumnSpec { id: ColumnId::Created, label: "Created", sortable: true },
    ColumnSpec { id: ColumnId::Fetched, label: "Fetched", sortable: true },
    ColumnSpec { id: ColumnId::State, label: "State", sortable: false },
    ColumnSpec { id: ColumnId::Details, label: "Details", sortable: false },
];

// ---------------------------------------------------------------------------
// Query and view models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Table request from the frontend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableQuery {
    /// Global search text; matches visible column content only.
    pub search: Option<String>,
    pub sort_column: Option<ColumnId>,
    pub direction: SortDirection,
    /// 1-based page number; out-of-range values are clamped.
    pub page: usize,
}

/// Two-line timestamp cell: relative text above, absolute text below.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeCell {
    pub relative: String,
    pub absolute: String,
}

/// The labeled state badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateBadge {
    pub label: String,
    pub emphasis: BadgeEmphasis,
}

/// One fully rendered table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRow {
    /// Row key for the detail trigger.
    pub key: String,
    pub resource_type: String,
    pub patient: String,
    pub created: TimeCell,
    pub fetched: TimeCell,
    pub state: StateBadge,
}

/// One page of the table plus the pagination indicator state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePage {
    pub rows: Vec<ResourceRow>,
    pub page: usize,
    pub page_count: usize,
    pub total_rows: usize,
    pub page_size: usize,
    /// Explicit "Page X of Y" indicator text.
    pub indicator: String,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render one record into its row. Relative times are blanked until
/// `live_time` is enabled after client mount.
pub fn render_row(wrapper: &ResourceWrapper, live_time: bool, now: DateTime<Utc>) -> ResourceRow {
    let meta = &wrapper.resource.metadata;
    let patient = if meta.identifier.patient_id.is_empty() {
        timefmt::DASH.to_string()
    } else {
        meta.identifier.patient_id.clone()
    };

    let time_cell = |text: &str| TimeCell {
        relative: timefmt::relative_or_blank(text, live_time, now),
        absolute: timefmt::format_absolute(text),
    };

    ResourceRow {
        key: wrapper.row_key().to_string(),
        resource_type: meta.resource_type.clone(),
        patient,
        created: time_cell(&meta.created_time),
        fetched: time_cell(&meta.fetch_time),
        state: StateBadge {
            label: meta.state.label(),
            emphasis: meta.state.badge_emphasis(),
        },
    }
}

/// Visible cell content of a row, lowercased, for global search.
/// The detail column has no text; narrative and AI summary are not
/// columns and are deliberately out of search scope.
fn searchable_text(row: &ResourceRow) -> String {
    [
        row.resource_type.as_str(),
        row.patient.as_str(),
        row.created.relative.as_str(),
        row.created.absolute.as_str(),
        row.fetched.relative.as_str(),
        row.fetched.absolute.as_str(),
        row.state.label.as_str(),
    ]
    .join(" ")
    .to_lowercase()
}

/// Build one page: filter by global search, sort by the requested column,
/// paginate at the fixed page size.
pub fn build_page(
    records: &[ResourceWrapper],
    query: &TableQuery,
    live_time: bool,
    now: DateTime<Utc>,
) -> TablePage {
    // Carry the numeric sort keys alongside the rendered rows so sorting
    // never re-parses cell text.
    let mut rows: Vec<(ResourceRow, i64, i64)> = records
        .iter()
        .map(|wrapper| {
            let meta = &wrapper.resource.metadata;
            (
                render_row(wrapper, live_time, now),
                timefmt::sort_key(&meta.created_time),
                timefmt::sort_key(&meta.fetch_time),
            )
        })
        .collect();

    if let Some(needle) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let needle = needle.to_lowercase();
        rows.retain(|(row, _, _)| searchable_text(row).contains(&needle));
    }

    // Direction goes through the comparator, not a post-sort reverse,
    // so equal-key rows keep their provider order in both directions.
    let directed = |ordering: Ordering| match query.direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    };
    match query.sort_column {
        Some(ColumnId::ResourceType) => {
            rows.sort_by(|(a, _, _), (b, _, _)| {
                directed(
                    a.resource_type
                        .to_lowercase()
                        .cmp(&b.resource_type.to_lowercase()),
                )
            });
        }
        Some(ColumnId::Patient) => {
            rows.sort_by(|(a, _, _), (b, _, _)| {
                directed(a.patient.to_lowercase().cmp(&b.patient.to_lowercase()))
            });
        }
        Some(ColumnId::Created) => {
            rows.sort_by(|(_, a, _), (_, b, _)| directed(a.cmp(b)));
        }
        Some(ColumnId::Fetched) => {
            rows.sort_by(|(_, _, a), (_, _, b)| directed(a.cmp(b)));
        }
        // Not sortable; keep the provider's order
        Some(ColumnId::State) | Some(ColumnId::Details) | None => {}
    }

    let total_rows = rows.len();
    let page_count = total_rows.div_ceil(PAGE_SIZE).max(1);
    let page = query.page.clamp(1, page_count);
    let start = (page - 1) * PAGE_SIZE;
    let rows: Vec<ResourceRow> = rows
        .into_iter()
        .skip(start)
        .take(PAGE_SIZE)
        .map(|(row, _, _)| row)
        .collect();

    TablePage {
        rows,
        page,
        page_count,
        total_rows,
        page_size: PAGE_SIZE,
        indicator: format!("Page {page} of {page_count}"),
    }
}
