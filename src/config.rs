//! Application constants and environment-provided configuration.
//!
//! Store connection parameters arrive through the environment rather than
//! CLI flags, so packaged builds and dev runs read the same knobs.

/// Application-level constants
pub const APP_NAME: &str = "FhirView";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum number of records held in the live working set.
pub const RECORD_LIMIT: usize = 500;

/// Remote store collection holding the resource documents.
pub const RESOURCE_COLLECTION: &str = "ehr_resources";

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "fhirview=info"
}

/// Connection parameters for the remote document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
}

impl StoreConfig {
    /// Read the store configuration from the process environment.
    ///
    /// Returns `None` when the required parameters (API key, auth domain,
    /// project id) are missing, in which case only demo mode can show data.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |key: &str| -> Option<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Some(Self {
            api_key: get("FHIRVIEW_API_KEY")?,
            auth_domain: get("FHIRVIEW_AUTH_DOMAIN")?,
            project_id: get("FHIRVIEW_PROJECT_ID")?,
            storage_bucket: get("FHIRVIEW_STORAGE_BUCKET").unwrap_or_default(),
            messaging_sender_id: get("FHIRVIEW_MESSAGING_SENDER_ID").unwrap_or_default(),
            app_id: get("FHIRVIEW_APP_ID").unwrap_or_default(),
        })
    }

    /// Streaming change-feed endpoint for the resource collection.
    pub fn listen_url(&self) -> String {
        format!(
            "https://{}.firebaseio.com/{}.json",
            self.project_id, RESOURCE_COLLECTION
        )
    }
}

/// Whether the environment forces demo mode (`FHIRVIEW_DEMO=1`).
pub fn demo_mode_from_env() -> bool {
    std::env::var("FHIRVIEW_DEMO")
        .map(|v| {
            let v = v.trim();
            v == "1" || v.eq_ignore_ascii_case("true")
        })
        .unwrap_or(false)
}
