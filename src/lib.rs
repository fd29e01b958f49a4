//! FhirView: a desktop viewer for EHR resource documents.
//!
//! The webview is a thin renderer; everything of substance lives here:
//! the session, the live record subscription, timestamp normalization
//! and the table/detail view models the frontend displays.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

pub mod auth;
pub mod commands;
pub mod config;
pub mod core_state;
pub mod demo;
pub mod models;
pub mod store;
pub mod view;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let state = Arc::new(core_state::CoreState::from_env());

    tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .manage(state)
        .invoke_handler(tauri::generate_handler![
            commands::health_check,
            commands::session::get_session,
            commands::session::sign_in,
            commands::session::complete_sign_in,
            commands::session::cancel_sign_in,
            commands::session::sign_out,
            commands::session::set_demo_mode,
            commands::resources::get_resource_table,
            commands::resources::get_resource_detail,
            commands::resources::list_columns,
        ])
        .run(tauri::generate_context!())
        .expect("error while running FhirView");
}
