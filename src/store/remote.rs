//! Streaming subscription to the remote store's change feed.
//!
//! The store exposes the resource collection as an SSE-style feed: frames
//! of `event:`/`data:` lines separated by blank lines. `put` and `patch`
//! frames carry a JSON `{path, data}` payload addressing either the
//! collection root or a single document. Reconnection is the store
//! client's concern, not ours: when the stream errors or closes we log and
//! stop, and the collection simply stops updating.

use std::sync::Arc;

use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::task::JoinHandle;

use super::working_set::{RecordChange, WorkingSet};
use super::StoreError;
use crate::config::{StoreConfig, RECORD_LIMIT};
use crate::models::ResourceWrapper;

/// Callback receiving each consistent snapshot of the working set.
pub type SnapshotSink = Arc<dyn Fn(Vec<ResourceWrapper>) + Send + Sync>;

/// Handle to a live record subscription.
///
/// Cancellation is synchronous: after `cancel` (or drop) returns, the
/// task is aborted and no further snapshots are published.
pub struct RecordSubscription {
    handle: JoinHandle<()>,
}

impl RecordSubscription {
    pub(crate) fn from_handle(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for RecordSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start a live subscription for the signed-in identity.
///
/// Must be called from within the async runtime. The sink fires once per
/// applied change with the full ordered snapshot.
pub fn subscribe(
    config: StoreConfig,
    auth_token: String,
    on_snapshot: SnapshotSink,
) -> RecordSubscription {
    let handle = tokio::spawn(async move {
        if let Err(err) = run_stream(&config, &auth_token, on_snapshot).await {
            tracing::warn!(error = %err, "record subscription ended");
        }
    });
    RecordSubscription { handle }
}

/// Feed URL: collection ordered by creation time, capped, authorized.
fn feed_url(config: &StoreConfig, auth_token: &str) -> String {
    format!(
        "{}?orderBy=%22resource/metadata/createdTime%22&limitToLast={}&auth={}",
        config.listen_url(),
        RECORD_LIMIT,
        auth_token
    )
}

async fn run_stream(
    config: &StoreConfig,
    auth_token: &str,
    on_snapshot: SnapshotSink,
) -> Result<(), StoreError> {
    let client = reqwest::Client::new();
    let response = client
        .get(feed_url(config, auth_token))
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(StoreError::Status(status.as_u16()));
    }
    tracing::info!("record subscription established");

    let mut working = WorkingSet::new(RECORD_LIMIT);
    let mut buffer = String::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(end) = buffer.find("\n\n") {
            let frame_text: String = buffer.drain(..end + 2).collect();
            if let Some(frame) = parse_frame(&frame_text) {
                handle_frame(&mut working, &frame, &on_snapshot)?;
            }
        }
    }

    tracing::info!("store closed the change feed");
    Ok(())
}

// ---------------------------------------------------------------------------
// Frame parsing
// ---------------------------------------------------------------------------

/// One SSE frame: event name plus joined data lines.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SseFrame {
    event: String,
    data: String,
}

/// `{path, data}` payload of put/patch frames.
#[derive(Debug, Deserialize)]
struct FeedPayload {
    path: String,
    data: Value,
}

fn parse_frame(text: &str) -> Option<SseFrame> {
    let mut event = None;
    let mut data = Vec::new();
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            event = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data.push(rest.trim_start().to_string());
        }
    }
    event.map(|event| SseFrame {
        event,
        data: data.join("\n"),
    })
}

/// Resolve one frame into working-set changes.
///
/// `keep-alive` frames are dropped; `cancel` and `auth_revoked` terminate
/// the stream. Paths deeper than one document are not produced by the
/// collection-level subscription and are skipped with a warning.
fn interpret_frame(event: &str, data: &str) -> Result<Vec<RecordChange>, StoreError> {
    match event {
        "keep-alive" => Ok(Vec::new()),
        "cancel" | "auth_revoked" => Err(StoreError::StreamClosed(event.to_string())),
        "put" | "patch" => {
            let payload: FeedPayload = serde_json::from_str(data)
                .map_err(|err| StoreError::MalformedFrame(err.to_string()))?;
            let segments: Vec<&str> = payload
                .path
                .trim_matches('/')
                .split('/')
                .filter(|s| !s.is_empty())
                .collect();
            Ok(resolve_changes(event, &segments, payload.data))
        }
        other => {
            tracing::debug!(event = other, "ignoring unknown feed event");
            Ok(Vec::new())
        }
    }
}

fn resolve_changes(event: &str, segments: &[&str], data: Value) -> Vec<RecordChange> {
    match (event, segments) {
        ("put", []) => match data {
            Value::Null => vec![RecordChange::Reset(None)],
            Value::Object(map) => vec![RecordChange::Reset(Some(map))],
            other => {
                tracing::warn!(?other, "non-object collection snapshot, skipping");
                Vec::new()
            }
        },
        ("put", [id]) => match data {
            Value::Null => vec![RecordChange::Remove { id: (*id).into() }],
            doc => vec![RecordChange::Upsert {
                id: (*id).into(),
                doc,
            }],
        },
        ("patch", []) => match data {
            // A root patch replaces each named document
            Value::Object(map) => map
                .into_iter()
                .map(|(id, doc)| RecordChange::Upsert { id, doc })
                .collect(),
            _ => Vec::new(),
        },
        ("patch", [id]) => match data {
            Value::Object(fields) => vec![RecordChange::Patch {
                id: (*id).into(),
                fields,
            }],
            _ => Vec::new(),
        },
        _ => {
            tracing::warn!(path = segments.join("/"), "skipping deep-path change");
            Vec::new()
        }
    }
}

fn handle_frame(
    working: &mut WorkingSet,
    frame: &SseFrame,
    on_snapshot: &SnapshotSink,
) -> Result<(), StoreError> {
    let changes = interpret_frame(&frame.event, &frame.data)?;
    if changes.is_empty() {
        return Ok(());
    }
    for change in changes {
        working.apply(change);
    }
    on_snapshot(working.snapshot());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn doc(key: &str, created: &str) -> Value {
        json!({
            "resource": {
                "metadata": {
                    "state": "PROCESSING_STATE_COMPLETED",
                    "createdTime": created,
                    "fetchTime": created,
                    "identifier": { "key": key, "uid": key, "patientId": "patient-1" },
                    "resourceType": "Observation",
                    "version": "FHIR_VERSION_R4"
                },
                "humanReadableStr": "narrative"
            }
        })
    }

    // -----------------------------------------------------------------------
    // parse_frame
    // -----------------------------------------------------------------------

    #[test]
    fn parses_event_and_data_lines() {
        let frame = parse_frame("event: put\ndata: {\"path\":\"/\",\"data\":null}\n").unwrap();
        assert_eq!(frame.event, "put");
        assert_eq!(frame.data, "{\"path\":\"/\",\"data\":null}");
    }

    #[test]
    fn joins_multiple_data_lines() {
        let frame = parse_frame("event: put\ndata: {\"path\":\"/\",\ndata: \"data\":null}\n");
        assert_eq!(frame.unwrap().data, "{\"path\":\"/\",\n\"data\":null}");
    }

    #[test]
    fn frame_without_event_is_dropped() {
        assert!(parse_frame("data: {}\n").is_none());
        assert!(parse_frame(": comment only\n").is_none());
    }

    // -----------------------------------------------------------------------
    // interpret_frame
    // -----------------------------------------------------------------------

    #[test]
    fn root_put_is_reset() {
        let data = json!({ "path": "/", "data": { "a": doc("a", "2025-03-01T09:00:00+00:00") } });
        let changes = interpret_frame("put", &data.to_string()).unwrap();
        assert_eq!(changes.len(), 1);
        assert!(matches!(changes[0], RecordChange::Reset(Some(_))));
    }

    #[test]
    fn null_root_put_empties_collection() {
        let changes =
            interpret_frame("put", "{\"path\":\"/\",\"data\":null}").unwrap();
        assert_eq!(changes, vec![RecordChange::Reset(None)]);
    }

    #[test]
    fn child_put_is_upsert_and_null_is_remove() {
        let data = json!({ "path": "/doc-7", "data": doc("doc-7", "2025-03-01T09:00:00+00:00") });
        let changes = interpret_frame("put", &data.to_string()).unwrap();
        assert!(matches!(&changes[0], RecordChange::Upsert { id, .. } if id == "doc-7"));

        let changes =
            interpret_frame("put", "{\"path\":\"/doc-7\",\"data\":null}").unwrap();
        assert_eq!(changes, vec![RecordChange::Remove { id: "doc-7".into() }]);
    }

    #[test]
    fn child_patch_merges_fields() {
        let data = json!({ "path": "/doc-7", "data": { "resource": { "aiSummary": "s" } } });
        let changes = interpret_frame("patch", &data.to_string()).unwrap();
        assert!(matches!(&changes[0], RecordChange::Patch { id, .. } if id == "doc-7"));
    }

    #[test]
    fn keep_alive_yields_nothing() {
        assert!(interpret_frame("keep-alive", "null").unwrap().is_empty());
    }

    #[test]
    fn cancel_and_auth_revoked_close_the_stream() {
        assert!(matches!(
            interpret_frame("cancel", "null"),
            Err(StoreError::StreamClosed(_))
        ));
        assert!(matches!(
            interpret_frame("auth_revoked", "\"token expired\""),
            Err(StoreError::StreamClosed(_))
        ));
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(matches!(
            interpret_frame("put", "{not json"),
            Err(StoreError::MalformedFrame(_))
        ));
    }

    // -----------------------------------------------------------------------
    // handle_frame
    // -----------------------------------------------------------------------

    #[test]
    fn snapshots_fire_per_applied_change() {
        let mut working = WorkingSet::new(RECORD_LIMIT);
        let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let sink: SnapshotSink = {
            let seen = Arc::clone(&seen);
            Arc::new(move |snapshot: Vec<ResourceWrapper>| {
                seen.lock().unwrap().push(snapshot.len());
            })
        };

        let put = |id: &str| SseFrame {
            event: "put".into(),
            data: json!({ "path": format!("/{id}"), "data": doc(id, "2025-03-01T09:00:00+00:00") })
                .to_string(),
        };

        handle_frame(&mut working, &put("a"), &sink).unwrap();
        handle_frame(&mut working, &put("b"), &sink).unwrap();
        handle_frame(
            &mut working,
            &SseFrame {
                event: "keep-alive".into(),
                data: "null".into(),
            },
            &sink,
        )
        .unwrap();

        // keep-alive publishes nothing
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn feed_url_carries_order_cap_and_auth() {
        let config = StoreConfig {
            api_key: "k".into(),
            auth_domain: "auth.example.org".into(),
            project_id: "ehr-demo".into(),
            storage_bucket: String::new(),
            messaging_sender_id: String::new(),
            app_id: String::new(),
        };
        let url = feed_url(&config, "tok-1");
        assert!(url.starts_with("https://ehr-demo.firebaseio.com/ehr_resources.json?"));
        assert!(url.contains("limitToLast=500"));
        assert!(url.contains("auth=tok-1"));
    }
}
