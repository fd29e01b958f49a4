//! Record browsing commands: table pages, detail panels, column metadata.

use std::sync::Arc;

use chrono::Utc;

use crate::core_state::CoreState;
use crate::view::{self, ColumnSpec, ResourceDetail, TablePage, TableQuery};

/// One page of the record table for the given query.
///
/// `live_time` is false until the frontend clock is mounted; relative
/// times render blank until then.
#[tauri::command]
pub fn get_resource_table(
    query: TableQuery,
    live_time: bool,
    state: tauri::State<'_, Arc<CoreState>>,
) -> Result<TablePage, String> {
    let records = state.records().map_err(|e| e.to_string())?;
    Ok(view::build_page(&records, &query, live_time, Utc::now()))
}

/// Detail panel for one record, looked up by its row key. `None` when
/// the record has left the collection since the table was rendered.
#[tauri::command]
pub fn get_resource_detail(
    key: String,
    live_time: bool,
    state: tauri::State<'_, Arc<CoreState>>,
) -> Result<Option<ResourceDetail>, String> {
    let records = state.records().map_err(|e| e.to_string())?;
    Ok(records
        .iter()
        .find(|record| record.row_key() == key)
        .map(|record| view::build_detail(record, live_time, Utc::now())))
}

/// Column descriptors, in display order.
#[tauri::command]
pub fn list_columns() -> Vec<ColumnSpec> {
    view::COLUMNS.to_vec()
}
