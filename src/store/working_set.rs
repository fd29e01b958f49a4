//! Bounded working set mirroring the store's resource collection.
//!
//! Holds raw documents keyed by store id and derives the projection the
//! viewer consumes: normalized wrappers ordered by creation time
//! descending, capped at the subscription limit. Every applied change
//! yields a fully consistent snapshot; partial updates never escape.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::normalize::normalize;
use crate::models::ResourceWrapper;
use crate::view::timefmt;

/// One change delivered by the store's feed, already resolved to an action
/// on the working set.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordChange {
    /// Full snapshot at the collection root; `None` means the collection
    /// is empty.
    Reset(Option<Map<String, Value>>),
    /// A document was written or replaced.
    Upsert { id: String, doc: Value },
    /// Individual fields of a document changed.
    Patch { id: String, fields: Map<String, Value> },
    /// A document was removed.
    Remove { id: String },
}

/// The live working set of raw documents.
pub struct WorkingSet {
    limit: usize,
    docs: HashMap<String, Value>,
}

impl WorkingSet {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            docs: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Apply one change. Removal of an unknown id and patching of an
    /// unknown id are both tolerated (the latter becomes an upsert of the
    /// patched fields, matching the store's merge semantics).
    pub fn apply(&mut self, change: RecordChange) {
        match change {
            RecordChange::Reset(None) => self.docs.clear(),
            RecordChange::Reset(Some(map)) => {
                self.docs = map.into_iter().collect();
            }
            RecordChange::Upsert { id, doc } => {
                self.docs.insert(id, doc);
            }
            RecordChange::Patch { id, fields } => {
                let doc = self
                    .docs
                    .entry(id)
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Some(target) = doc.as_object_mut() {
                    for (key, value) in fields {
                        target.insert(key, value);
                    }
                }
            }
            RecordChange::Remove { id } => {
                self.docs.remove(&id);
            }
        }
    }

    /// The ordered, capped, normalized projection of the current set.
    ///
    /// Order: `metadata.createdTime` descending, tie-break on store id so
    /// re-emits are stable. Unparseable creation times sort as the
    /// earliest possible value (last in descending order).
    pub fn snapshot(&self) -> Vec<ResourceWrapper> {
        let mut wrappers: Vec<(i64, ResourceWrapper)> = self
            .docs
            .iter()
            .map(|(id, doc)| {
                let mut doc = doc.clone();
                if let Some(obj) = doc.as_object_mut() {
                    // The store id lives on the path, not in the document
                    obj.insert("id".into(), Value::String(id.clone()));
                }
                let wrapper = normalize(doc);
                let key = timefmt::sort_key(&wrapper.resource.metadata.created_time);
                (key, wrapper)
            })
            .collect();

        wrappers.sort_by(|(ka, a), (kb, b)| kb.cmp(ka).then_with(|| a.id.cmp(&b.id)));
        wrappers.truncate(self.limit);
        wrappers.into_iter().map(|(_, w)| w).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

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

    fn upsert(ws: &mut WorkingSet, id: &str, created: &str) {
        ws.apply(RecordChange::Upsert {
            id: id.into(),
            doc: doc(id, created),
        });
    }

    // -----------------------------------------------------------------------
    // Ordering and cap
    // -----------------------------------------------------------------------

    #[test]
    fn snapshot_is_created_time_descending() {
        let mut ws = WorkingSet::new(500);
        upsert(&mut ws, "a", "2025-03-01T09:00:00+00:00");
        upsert(&mut ws, "b", "2025-03-03T09:00:00+00:00");
        upsert(&mut ws, "c", "2025-03-02T09:00:00+00:00");

        let ids: Vec<_> = ws
            .snapshot()
            .iter()
            .map(|w| w.id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn unparseable_created_time_sorts_last() {
        let mut ws = WorkingSet::new(500);
        upsert(&mut ws, "ok", "2025-03-01T09:00:00+00:00");
        upsert(&mut ws, "bad", "not a timestamp");

        let ids: Vec<_> = ws
            .snapshot()
            .iter()
            .map(|w| w.id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["ok", "bad"]);
    }

    #[test]
    fn snapshot_respects_limit() {
        let mut ws = WorkingSet::new(2);
        upsert(&mut ws, "old", "2025-03-01T09:00:00+00:00");
        upsert(&mut ws, "mid", "2025-03-02T09:00:00+00:00");
        upsert(&mut ws, "new", "2025-03-03T09:00:00+00:00");

        let snapshot = ws.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id.as_deref(), Some("new"));
        assert_eq!(snapshot[1].id.as_deref(), Some("mid"));
    }

    #[test]
    fn equal_created_times_tie_break_on_id() {
        let mut ws = WorkingSet::new(500);
        upsert(&mut ws, "zulu", "2025-03-01T09:00:00+00:00");
        upsert(&mut ws, "alfa", "2025-03-01T09:00:00+00:00");

        let first = ws.snapshot();
        let second = ws.snapshot();
        assert_eq!(first, second);
        assert_eq!(first[0].id.as_deref(), Some("alfa"));
    }

    // -----------------------------------------------------------------------
    // Change application
    // -----------------------------------------------------------------------

    #[test]
    fn reset_replaces_everything() {
        let mut ws = WorkingSet::new(500);
        upsert(&mut ws, "stale", "2025-03-01T09:00:00+00:00");

        let mut map = Map::new();
        map.insert("fresh".into(), doc("fresh", "2025-03-05T09:00:00+00:00"));
        ws.apply(RecordChange::Reset(Some(map)));

        let snapshot = ws.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id.as_deref(), Some("fresh"));
    }

    #[test]
    fn reset_to_none_empties_the_set() {
        let mut ws = WorkingSet::new(500);
        upsert(&mut ws, "a", "2025-03-01T09:00:00+00:00");
        ws.apply(RecordChange::Reset(None));
        assert!(ws.is_empty());
        assert!(ws.snapshot().is_empty());
    }

    #[test]
    fn remove_drops_the_document() {
        let mut ws = WorkingSet::new(500);
        upsert(&mut ws, "a", "2025-03-01T09:00:00+00:00");
        upsert(&mut ws, "b", "2025-03-02T09:00:00+00:00");
        ws.apply(RecordChange::Remove { id: "a".into() });

        let snapshot = ws.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id.as_deref(), Some("b"));

        // Removing an unknown id is tolerated
        ws.apply(RecordChange::Remove { id: "ghost".into() });
        assert_eq!(ws.len(), 1);
    }

    #[test]
    fn patch_merges_fields_into_existing_doc() {
        let mut ws = WorkingSet::new(500);
        upsert(&mut ws, "a", "2025-03-01T09:00:00+00:00");

        let mut patched = doc("a", "2025-03-01T09:00:00+00:00");
        patched["resource"]["aiSummary"] = json!("New summary text.");
        let mut fields = Map::new();
        fields.insert("resource".into(), patched["resource"].clone());
        ws.apply(RecordChange::Patch {
            id: "a".into(),
            fields,
        });

        let snapshot = ws.snapshot();
        assert_eq!(
            snapshot[0].resource.ai_summary.as_deref(),
            Some("New summary text.")
        );
    }

    #[test]
    fn snapshot_injects_store_id() {
        let mut ws = WorkingSet::new(500);
        upsert(&mut ws, "store-id-1", "2025-03-01T09:00:00+00:00");
        let snapshot = ws.snapshot();
        assert_eq!(snapshot[0].id.as_deref(), Some("store-id-1"));
    }
}
