//! Demo mode data: a fixed identity and two hand-authored records.
//!
//! Used for screenshots, offline demos, and repeatable tests; rendering
//! must be deterministic, so every value here is a literal. No network
//! access, no credentials.

use crate::auth::Identity;
use crate::models::{
    ProcessingState, ResourceIdentifier, ResourceMetadata, ResourceRecord, ResourceVersion,
    ResourceWrapper,
};

/// Placeholder identity shown while demo mode is active.
pub fn demo_identity() -> Identity {
    Identity {
        uid: "demo-user".to_string(),
        email: "demo@fhirview.local".to_string(),
    }
}

/// The two demo records. Wrapper ids are absent: these rows are
/// client-synthesized, never store-assigned.
pub fn demo_records() -> Vec<ResourceWrapper> {
    vec![
        ResourceWrapper {
            id: None,
            resource: ResourceRecord {
                metadata: ResourceMetadata {
                    state: ProcessingState::Completed,
                    created_time: "2025-01-15T10:30:00+00:00".to_string(),
                    fetch_time: "2025-01-15T10:31:12+00:00".to_string(),
                    processed_time: Some("2025-01-15T10:34:05+00:00".to_string()),
                    identifier: ResourceIdentifier {
                        key: "demo-1".to_string(),
                        uid: "b5f3a0d2-8a11-4c6e-9f0b-2d34c1a7e991".to_string(),
                        patient_id: "patient-001".to_string(),
                    },
                    resource_type: "Observation".to_string(),
                    version: ResourceVersion::R4,
                    extra: Default::default(),
                },
                human_readable_str:
                    "Blood pressure 120/80 mmHg, heart rate 72 bpm. Recorded during routine visit."
                        .to_string(),
                ai_summary: Some(
                    "Vital signs within normal limits; no follow-up indicated.".to_string(),
                ),
                extra: Default::default(),
            },
        },
        ResourceWrapper {
            id: None,
            resource: ResourceRecord {
                metadata: ResourceMetadata {
                    state: ProcessingState::Processing,
                    created_time: "2025-01-14T16:45:00+00:00".to_string(),
                    fetch_time: "2025-01-14T16:46:30+00:00".to_string(),
                    processed_time: None,
                    identifier: ResourceIdentifier {
                        key: "demo-2".to_string(),
                        uid: "7c129e4b-55d0-4f7a-8e3c-90ab6f52d148".to_string(),
                        patient_id: "patient-002".to_string(),
                    },
                    resource_type: "MedicationRequest".to_string(),
                    version: ResourceVersion::R4B,
                    extra: Default::default(),
                },
                human_readable_str:
                    "Lisinopril 10 mg oral tablet, once daily. 30-day supply, 2 refills."
                        .to_string(),
                ai_summary: None,
                extra: Default::default(),
            },
        },
    ]
}
