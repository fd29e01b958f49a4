//! Tauri IPC command surface.
//!
//! Commands return `Result<T, String>` so the frontend gets a plain
//! message; structured errors stay internal and are logged here.

pub mod resources;
pub mod session;

use serde::Serialize;

use crate::config;

#[derive(Debug, Serialize)]
pub struct HealthInfo {
    pub app: &'static str,
    pub version: &'static str,
    pub demo: bool,
    pub configured: bool,
}

/// Liveness probe for the frontend splash screen.
#[tauri::command]
pub fn health_check(state: tauri::State<'_, std::sync::Arc<crate::core_state::CoreState>>) -> HealthInfo {
    HealthInfo {
        app: config::APP_NAME,
        version: config::APP_VERSION,
        demo: state.is_demo(),
        configured: state.store_config().is_ok(),
    }
}
