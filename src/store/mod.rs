//! Remote record store boundary.
//!
//! Everything store-shaped lives here: the normalization of raw documents
//! into the canonical wrapper shape, the bounded working set that mirrors
//! the store's ordering contract, and the streaming change-feed client.
//! The store's own query/rule semantics stay on the store's side; this
//! layer only decodes what arrives.

pub mod normalize;
pub mod remote;
pub mod working_set;

pub use normalize::normalize;
pub use remote::RecordSubscription;
pub use working_set::{RecordChange, WorkingSet};

/// Errors from the store boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store rejected the subscription (status {0})")]
    Status(u16),

    #[error("Malformed change-feed frame: {0}")]
    MalformedFrame(String),

    #[error("Store closed the stream: {0}")]
    StreamClosed(String),
}
