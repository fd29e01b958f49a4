//! Normalization of raw store documents into [`ResourceWrapper`].
//!
//! The store delivers heterogeneous timestamp shapes: documents written by
//! older producers carry native temporal objects (`{seconds, nanoseconds}`,
//! sometimes underscore-prefixed), newer ones carry ISO-8601 text. The
//! presentation layer only ever sees text, so the conversion happens here,
//! once, at the boundary.
//!
//! `normalize` is total: it never panics and never returns an error. A
//! field that cannot be converted is passed through as-received (rendered
//! into its literal JSON text) rather than dropped.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::models::resource::value_to_text;
use crate::models::ResourceWrapper;

/// Timestamp fields subject to conversion, all under `resource.metadata`.
const TIMESTAMP_FIELDS: &[&str] = &["createdTime", "fetchTime", "processedTime"];

/// Convert one raw store document into the canonical wrapper shape.
pub fn normalize(mut raw: Value) -> ResourceWrapper {
    if !raw.is_object() {
        tracing::warn!("non-object store document, carrying raw text as narrative");
        let mut wrapper = ResourceWrapper::default();
        wrapper.resource.human_readable_str = value_to_text(raw);
        return wrapper;
    }

    shape_timestamps(&mut raw);

    serde_json::from_value(raw).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "store document did not decode, using defaults");
        ResourceWrapper::default()
    })
}

/// Rewrite native temporal values under `resource.metadata` to ISO text.
/// Absent fields stay absent; text and unrecognized shapes pass through.
fn shape_timestamps(raw: &mut Value) {
    let Some(metadata) = raw
        .pointer_mut("/resource/metadata")
        .and_then(Value::as_object_mut)
    else {
        return;
    };

    for field in TIMESTAMP_FIELDS {
        if let Some(slot) = metadata.get_mut(*field) {
            let shaped = to_iso_text(slot.take());
            *slot = shaped;
        }
    }
}

/// Total conversion of a single timestamp value.
fn to_iso_text(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s),
        Value::Object(map) => match native_instant(&map) {
            Some(instant) => Value::String(instant.to_rfc3339()),
            None => Value::Object(map),
        },
        other => other,
    }
}

/// Decode a store-native temporal object, if that is what this map is.
fn native_instant(map: &Map<String, Value>) -> Option<DateTime<Utc>> {
    let seconds = map
        .get("seconds")
        .or_else(|| map.get("_seconds"))?
        .as_i64()?;
    let nanos = map
        .get("nanoseconds")
        .or_else(|| map.get("_nanoseconds"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    DateTime::from_timestamp(seconds, u32::try_from(nanos).ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_doc(created: Value, fetched: Value) -> Value {
        json!({
            "id": "doc-9",
            "resource": {
                "metadata": {
                    "state": "PROCESSING_STATE_COMPLETED",
                    "createdTime": created,
                    "fetchTime": fetched,
                    "identifier": { "key": "k-1", "uid": "u-1", "patientId": "patient-9" },
                    "resourceType": "DiagnosticReport",
                    "version": "FHIR_VERSION_R4B"
                },
                "humanReadableStr": "CBC panel within normal limits."
            }
        })
    }

    // -----------------------------------------------------------------------
    // Timestamp conversion
    // -----------------------------------------------------------------------

    #[test]
    fn native_temporal_becomes_iso_text() {
        // 2025-03-01T09:15:00Z
        let doc = raw_doc(
            json!({ "seconds": 1740820500, "nanoseconds": 0 }),
            json!("2025-03-01T09:16:05+00:00"),
        );
        let wrapper = normalize(doc);
        let created = &wrapper.resource.metadata.created_time;
        assert_eq!(
            created.parse::<DateTime<Utc>>().unwrap(),
            DateTime::from_timestamp(1740820500, 0).unwrap()
        );
        // Already-text field passes through unchanged
        assert_eq!(
            wrapper.resource.metadata.fetch_time,
            "2025-03-01T09:16:05+00:00"
        );
    }

    #[test]
    fn underscore_prefixed_temporal_is_recognized() {
        let doc = raw_doc(
            json!({ "_seconds": 1740820500, "_nanoseconds": 500000000 }),
            json!("2025-03-01T09:16:05+00:00"),
        );
        let wrapper = normalize(doc);
        assert_eq!(
            wrapper
                .resource
                .metadata
                .created_time
                .parse::<DateTime<Utc>>()
                .unwrap(),
            DateTime::from_timestamp(1740820500, 500_000_000).unwrap()
        );
    }

    #[test]
    fn normalize_is_idempotent_on_timestamps() {
        let doc = raw_doc(
            json!({ "seconds": 1740820500, "nanoseconds": 0 }),
            json!("2025-03-01T09:16:05+00:00"),
        );
        let once = normalize(doc);
        let twice = normalize(serde_json::to_value(&once).unwrap());
        assert_eq!(
            once.resource.metadata.created_time,
            twice.resource.metadata.created_time
        );
        assert_eq!(
            once.resource.metadata.fetch_time,
            twice.resource.metadata.fetch_time
        );
        assert_eq!(once, twice);
    }

    #[test]
    fn absent_processed_time_stays_absent() {
        let wrapper = normalize(raw_doc(
            json!("2025-03-01T09:15:00+00:00"),
            json!("2025-03-01T09:16:05+00:00"),
        ));
        assert!(wrapper.resource.metadata.processed_time.is_none());
    }

    #[test]
    fn present_processed_time_is_converted() {
        let mut doc = raw_doc(
            json!("2025-03-01T09:15:00+00:00"),
            json!("2025-03-01T09:16:05+00:00"),
        );
        doc["resource"]["metadata"]["processedTime"] =
            json!({ "seconds": 1740820720, "nanoseconds": 0 });
        let wrapper = normalize(doc);
        let processed = wrapper.resource.metadata.processed_time.unwrap();
        assert_eq!(
            processed.parse::<DateTime<Utc>>().unwrap(),
            DateTime::from_timestamp(1740820720, 0).unwrap()
        );
    }

    // -----------------------------------------------------------------------
    // Total on malformed input
    // -----------------------------------------------------------------------

    #[test]
    fn unrecognized_timestamp_shape_passes_through() {
        // Neither text nor a native temporal object
        let wrapper = normalize(raw_doc(json!(42), json!({ "oddly": "shaped" })));
        assert_eq!(wrapper.resource.metadata.created_time, "42");
        assert_eq!(wrapper.resource.metadata.fetch_time, "{\"oddly\":\"shaped\"}");
    }

    #[test]
    fn out_of_range_seconds_pass_through() {
        let wrapper = normalize(raw_doc(
            json!({ "seconds": i64::MAX, "nanoseconds": 0 }),
            json!("2025-03-01T09:16:05+00:00"),
        ));
        // Unconvertible object kept as-received, in literal JSON text
        assert!(wrapper.resource.metadata.created_time.contains("seconds"));
    }

    #[test]
    fn non_object_document_never_panics() {
        let wrapper = normalize(json!("stray string"));
        assert_eq!(wrapper.resource.human_readable_str, "stray string");
        assert!(wrapper.id.is_none());
    }

    #[test]
    fn unknown_fields_survive_normalization() {
        let mut doc = raw_doc(
            json!("2025-03-01T09:15:00+00:00"),
            json!("2025-03-01T09:16:05+00:00"),
        );
        doc["resource"]["metadata"]["pipelineRun"] = json!("run-77");
        let wrapper = normalize(doc);
        assert_eq!(wrapper.resource.metadata.extra["pipelineRun"], json!("run-77"));
    }
}
