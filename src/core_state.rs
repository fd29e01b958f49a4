//! Shared application state: session, record collection, subscription.
//!
//! A single `CoreState` wrapped in `Arc` is managed by Tauri and shared
//! by every IPC command. `RwLock` keeps the read paths (table rendering)
//! concurrent while sign-in/sign-out take the write side. All record data
//! arrives through the subscription callback, so the collection snapshot
//! handed to the view is always consistent as of the last change.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use tokio::sync::oneshot;

use crate::auth::{Identity, IdentityClaims};
use crate::config::{self, StoreConfig};
use crate::demo;
use crate::models::ResourceWrapper;
use crate::store::RecordSubscription;

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Store connection is not configured")]
    NotConfigured,
}

pub struct CoreState {
    /// Whether demo mode is active (env override or `demo=1`).
    demo: AtomicBool,
    /// Store connection parameters; `None` when the environment lacks them.
    store: Option<StoreConfig>,
    /// Signed-in identity. `None` while signed out.
    identity: RwLock<Option<Identity>>,
    /// Latest consistent snapshot of the record collection.
    records: RwLock<Vec<ResourceWrapper>>,
    /// Active record subscription; dropping the handle aborts the task.
    subscription: Mutex<Option<RecordSubscription>>,
    /// Generation of the active subscription. Aborting a subscription
    /// task only lands at its next await point, so a task can still be
    /// holding a decoded frame when sign-out returns; the generation
    /// check in `set_records_if_current` is what actually keeps that
    /// late snapshot out of the cleared collection.
    subscription_generation: AtomicU64,
    /// In-flight interactive sign-in attempt, resolved by the popup
    /// callback or dropped on cancel/timeout.
    pending_sign_in: Mutex<Option<oneshot::Sender<IdentityClaims>>>,
}

impl CoreState {
    pub fn new(store: Option<StoreConfig>, demo: bool) -> Self {
        let state = Self {
            demo: AtomicBool::new(demo),
            store,
            identity: RwLock::new(None),
            records: RwLock::new(Vec::new()),
            subscription: Mutex::new(None),
            subscription_generation: AtomicU64::new(0),
            pending_sign_in: Mutex::new(None),
        };
        if demo {
            // Demo data is static; no subscription, no network
            if let Ok(mut identity) = state.identity.write() {
                *identity = Some(demo::demo_identity());
            }
            if let Ok(mut records) = state.records.write() {
                *records = demo::demo_records();
            }
        }
        state
    }

    /// Build state from the process environment.
    pub fn from_env() -> Self {
        Self::new(StoreConfig::from_env(), config::demo_mode_from_env())
    }

    pub fn is_demo(&self) -> bool {
        self.demo.load(Ordering::SeqCst)
    }

    pub fn store_config(&self) -> Result<StoreConfig, CoreError> {
        self.store.clone().ok_or(CoreError::NotConfigured)
    }

    // ── Identity ────────────────────────────────────────────

    pub fn identity(&self) -> Result<Option<Identity>, CoreError> {
        self.identity
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| CoreError::LockPoisoned)
    }

    pub fn set_identity(&self, identity: Identity) -> Result<(), CoreError> {
        let mut guard = self.identity.write().map_err(|_| CoreError::LockPoisoned)?;
        *guard = Some(identity);
        Ok(())
    }

    // ── Records ─────────────────────────────────────────────

    pub fn records(&self) -> Result<Vec<ResourceWrapper>, CoreError> {
        self.records
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| CoreError::LockPoisoned)
    }

    pub fn set_records(&self, records: Vec<ResourceWrapper>) -> Result<(), CoreError> {
        let mut guard = self.records.write().map_err(|_| CoreError::LockPoisoned)?;
        *guard = records;
        Ok(())
    }

    /// Store a snapshot from the subscription carrying `generation`,
    /// rejecting it when that subscription has since been cancelled or
    /// replaced. The generation is compared under the records write
    /// lock, so a snapshot that passes the check is always overwritten
    /// by a later sign-out clear, never the other way around.
    pub fn set_records_if_current(
        &self,
        generation: u64,
        records: Vec<ResourceWrapper>,
    ) -> Result<bool, CoreError> {
        let mut guard = self.records.write().map_err(|_| CoreError::LockPoisoned)?;
        if self.subscription_generation.load(Ordering::SeqCst) != generation {
            return Ok(false);
        }
        *guard = records;
        Ok(true)
    }

    // ── Subscription lifecycle ──────────────────────────────

    /// Reserve the generation for a subscription about to be installed.
    /// Bumping it here already invalidates the previous subscription's
    /// snapshots, even before its task is aborted.
    pub fn next_subscription_generation(&self) -> u64 {
        self.subscription_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Install a fresh subscription, synchronously cancelling any
    /// previous one so two feeds never publish interleaved snapshots.
    pub fn install_subscription(&self, subscription: RecordSubscription) -> Result<(), CoreError> {
        let mut guard = self
            .subscription
            .lock()
            .map_err(|_| CoreError::LockPoisoned)?;
        if let Some(old) = guard.replace(subscription) {
            old.cancel();
        }
        Ok(())
    }

    /// Abort the active subscription, if any, and invalidate its
    /// generation so a snapshot its task already decoded can no longer
    /// land through `set_records_if_current`.
    pub fn cancel_subscription(&self) {
        self.subscription_generation.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.subscription.lock() {
            if let Some(subscription) = guard.take() {
                subscription.cancel();
            }
        }
    }

    pub fn has_subscription(&self) -> bool {
        self.subscription
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    // ── Sign-in attempt tracking ────────────────────────────

    /// Start a new interactive sign-in attempt. Any previous pending
    /// attempt is abandoned (its popup result will be ignored).
    pub fn begin_sign_in(&self) -> Result<oneshot::Receiver<IdentityClaims>, CoreError> {
        let (tx, rx) = oneshot::channel();
        let mut guard = self
            .pending_sign_in
            .lock()
            .map_err(|_| CoreError::LockPoisoned)?;
        *guard = Some(tx);
        Ok(rx)
    }

    /// Deliver popup claims to the pending attempt. Returns `false` when
    /// no attempt is waiting (stale or duplicate callback).
    pub fn resolve_sign_in(&self, claims: IdentityClaims) -> bool {
        let Ok(mut guard) = self.pending_sign_in.lock() else {
            return false;
        };
        match guard.take() {
            Some(tx) => tx.send(claims).is_ok(),
            None => false,
        }
    }

    /// Drop the pending attempt; the waiting sign-in resolves with no
    /// state change.
    pub fn abandon_sign_in(&self) {
        if let Ok(mut guard) = self.pending_sign_in.lock() {
            *guard = None;
        }
    }

    // ── Session teardown ────────────────────────────────────

    /// Sign out: abandon any pending sign-in, abort the subscription,
    /// clear the identity and empty the collection. Idempotent.
    pub fn sign_out(&self) -> Result<(), CoreError> {
        self.abandon_sign_in();
        self.cancel_subscription();
        {
            let mut identity = self.identity.write().map_err(|_| CoreError::LockPoisoned)?;
            *identity = None;
        }
        let mut records = self.records.write().map_err(|_| CoreError::LockPoisoned)?;
        records.clear();
        tracing::info!("signed out, record collection cleared");
        Ok(())
    }

    /// Switch demo mode. Returns `true` when the flag actually changed.
    ///
    /// Entering demo replaces the session with the placeholder identity
    /// and the fixed records; leaving it signs out entirely.
    pub fn set_demo_mode(&self, enabled: bool) -> Result<bool, CoreError> {
        let was = self.demo.swap(enabled, Ordering::SeqCst);
        if was == enabled {
            return Ok(false);
        }
        self.sign_out()?;
        if enabled {
            self.set_identity(demo::demo_identity())?;
            self.set_records(demo::demo_records())?;
            tracing::info!("demo mode enabled");
        } else {
            tracing::info!("demo mode disabled");
        }
        Ok(true)
    }
}
