//! Presentation layer: fully rendered view models for the table and the
//! detail panel. The webview displays these verbatim; no raw metadata or
//! store-native values cross the IPC boundary.

pub mod detail;
pub mod table;
pub mod timefmt;

pub use detail::{build_detail, ResourceDetail};
pub use table::{build_page, ColumnSpec, TablePage, TableQuery, COLUMNS, PAGE_SIZE};
