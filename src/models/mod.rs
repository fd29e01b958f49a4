//! Data model for EHR resource documents as surfaced to the viewer.

pub mod enums;
pub mod resource;

pub use enums::{BadgeEmphasis, ProcessingState, ResourceVersion};
pub use resource::{ResourceIdentifier, ResourceMetadata, ResourceRecord, ResourceWrapper};

/// Errors from strict model parsing.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Unknown {field} tag: {value}")]
    UnknownTag { field: String, value: String },
}
