//! Session commands: interactive sign-in, sign-out, demo switching.
//!
//! Sign-in opens the provider page in the system browser and waits for
//! the popup callback to post its claims back through
//! `complete_sign_in`. A cancelled or timed-out attempt resolves quietly
//! with the session unchanged.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tauri::{AppHandle, Emitter};
use tauri_plugin_shell::ShellExt;
use tokio::time::timeout;

use crate::auth::{self, Identity, IdentityClaims, SIGN_IN_TIMEOUT_SECS};
use crate::core_state::CoreState;
use crate::store;

/// Event fired whenever the signed-in identity changes.
pub const IDENTITY_CHANGED: &str = "identity-changed";
/// Event fired whenever the record collection snapshot changes.
pub const RECORDS_CHANGED: &str = "records-changed";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub uid: String,
    pub email: String,
    pub demo: bool,
}

fn session_info(identity: &Identity, demo: bool) -> SessionInfo {
    SessionInfo {
        uid: identity.uid.clone(),
        email: identity.email.clone(),
        demo,
    }
}

/// Current session, or `None` while signed out.
#[tauri::command]
pub fn get_session(state: tauri::State<'_, Arc<CoreState>>) -> Result<Option<SessionInfo>, String> {
    let identity = state.identity().map_err(|e| e.to_string())?;
    Ok(identity.map(|id| session_info(&id, state.is_demo())))
}

/// Start an interactive sign-in.
///
/// Resolves with the new session once the popup posts back, or with
/// `None` if the attempt is cancelled or times out.
#[tauri::command]
pub async fn sign_in(
    app: AppHandle,
    state: tauri::State<'_, Arc<CoreState>>,
) -> Result<Option<SessionInfo>, String> {
    if state.is_demo() {
        // Demo sessions are fixed; nothing to sign into
        return get_session(state);
    }
    let config = state.store_config().map_err(|e| e.to_string())?;

    let nonce = uuid::Uuid::new_v4();
    let url = auth::sign_in_url(&config, &nonce);
    let receiver = state.begin_sign_in().map_err(|e| e.to_string())?;

    tracing::info!(nonce = %nonce, "opening sign-in page");
    app.shell()
        .open(url, None)
        .map_err(|e| format!("Could not open sign-in page: {e}"))?;

    match timeout(Duration::from_secs(SIGN_IN_TIMEOUT_SECS), receiver).await {
        Ok(Ok(claims)) => {
            let identity = establish_session(&app, &state, claims).map_err(|e| e.to_string())?;
            Ok(Some(session_info(&identity, false)))
        }
        Ok(Err(_)) => {
            // Attempt abandoned via cancel_sign_in; session unchanged
            tracing::info!("sign-in cancelled");
            Ok(None)
        }
        Err(_) => {
            tracing::info!("sign-in timed out");
            state.abandon_sign_in();
            Ok(None)
        }
    }
}

/// Called by the popup callback page with the provider's claims.
///
/// Returns `false` when no sign-in attempt is waiting.
#[tauri::command]
pub fn complete_sign_in(
    claims: IdentityClaims,
    state: tauri::State<'_, Arc<CoreState>>,
) -> Result<bool, String> {
    Ok(state.resolve_sign_in(claims))
}

/// Abandon the in-flight sign-in attempt, if any.
#[tauri::command]
pub fn cancel_sign_in(state: tauri::State<'_, Arc<CoreState>>) -> Result<(), String> {
    state.abandon_sign_in();
    Ok(())
}

/// Sign out and clear the record collection. Idempotent; a no-op in
/// demo mode.
#[tauri::command]
pub async fn sign_out(
    app: AppHandle,
    state: tauri::State<'_, Arc<CoreState>>,
) -> Result<(), String> {
    if state.is_demo() {
        return Ok(());
    }
    state.sign_out().map_err(|e| e.to_string())?;
    let _ = app.emit(IDENTITY_CHANGED, ());
    let _ = app.emit(RECORDS_CHANGED, 0usize);
    Ok(())
}

/// Switch demo mode on or off. Returns `true` when the mode changed.
#[tauri::command]
pub fn set_demo_mode(
    enabled: bool,
    app: AppHandle,
    state: tauri::State<'_, Arc<CoreState>>,
) -> Result<bool, String> {
    let changed = state.set_demo_mode(enabled).map_err(|e| e.to_string())?;
    if changed {
        let records = state.records().map_err(|e| e.to_string())?;
        let _ = app.emit(IDENTITY_CHANGED, ());
        let _ = app.emit(RECORDS_CHANGED, records.len());
    }
    Ok(changed)
}

/// Record the identity and start the live record subscription.
fn establish_session(
    app: &AppHandle,
    state: &Arc<CoreState>,
    claims: IdentityClaims,
) -> Result<Identity, crate::core_state::CoreError> {
    let identity = Identity::from(&claims);
    state.set_identity(identity.clone())?;

    let config = state.store_config()?;
    let generation = state.next_subscription_generation();
    let sink_app = app.clone();
    let sink_state = Arc::clone(state);
    let sink: store::remote::SnapshotSink = Arc::new(move |snapshot| {
        let count = snapshot.len();
        match sink_state.set_records_if_current(generation, snapshot) {
            Ok(true) => {
                let _ = sink_app.emit(RECORDS_CHANGED, count);
            }
            Ok(false) => {
                tracing::debug!(generation, "dropping snapshot from a stale subscription");
            }
            Err(err) => tracing::warn!(error = %err, "dropping record snapshot"),
        }
    });
    let subscription = store::remote::subscribe(config, claims.id_token, sink);
    state.install_subscription(subscription)?;

    let _ = app.emit(IDENTITY_CHANGED, ());
    tracing::info!(uid = %identity.uid, "session established");
    Ok(identity)
}
