//! Identity provider boundary.
//!
//! The interactive part of sign-in happens in the provider's own popup
//! page; this module only builds the page URL (with a fresh nonce) and
//! defines the claims the popup hands back. Sign-in failure is never
//! fatal: an abandoned or cancelled attempt leaves the session untouched.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::StoreConfig;

/// How long a sign-in attempt may stay pending before it is treated as
/// abandoned (popup closed without completing).
pub const SIGN_IN_TIMEOUT_SECS: u64 = 300;

/// The signed-in identity as tracked by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: String,
}

/// Claims delivered by the identity provider popup on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaims {
    pub uid: String,
    pub email: String,
    /// Token the record subscription presents to the store.
    pub id_token: String,
}

impl From<&IdentityClaims> for Identity {
    fn from(claims: &IdentityClaims) -> Self {
        Self {
            uid: claims.uid.clone(),
            email: claims.email.clone(),
        }
    }
}

/// Provider sign-in page URL for one attempt.
pub fn sign_in_url(config: &StoreConfig, nonce: &Uuid) -> String {
    format!(
        "https://{}/signin?apiKey={}&appId={}&state={}",
        config.auth_domain, config.api_key, config.app_id, nonce
    )
}
