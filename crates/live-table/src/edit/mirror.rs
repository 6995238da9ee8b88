//! CollectionMirror: the authoritative local copy of one remote collection.
//!
//! Snapshots replace the copy wholesale (the channel sends full collections,
//! never deltas). A failed delivery keeps the last good copy. Display order is
//! derived from the schema's `order_by` field and then the key, never from
//! arrival order, so rows do not jump around on every push.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::{
    error::SubscriptionError,
    schema::EntitySchema,
    types::{Collection, FieldValue, Key, Record, Row},
};

use super::session::{EditSession, RebaseOutcome};

/// Result of applying one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotOutcome {
    /// Records visible after the snapshot.
    pub records: usize,
    /// Effect on the active edit session.
    pub rebase: RebaseOutcome,
}

#[derive(Debug)]
pub struct CollectionMirror {
    collection: String,
    order_by: Option<String>,
    records: Collection,
    /// Keys removed optimistically, hidden until a snapshot confirms removal.
    hidden: BTreeSet<Key>,
    last_error: Option<SubscriptionError>,
    snapshots_applied: u64,
}

impl CollectionMirror {
    pub fn new(collection: impl Into<String>, order_by: Option<String>) -> Self {
        Self {
            collection: collection.into(),
            order_by,
            records: Collection::new(),
            hidden: BTreeSet::new(),
            last_error: None,
            snapshots_applied: 0,
        }
    }

    pub fn for_schema(schema: &EntitySchema) -> Self {
        Self::new(schema.name.clone(), schema.order_by.clone())
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Replace the local copy with `snapshot` and reconcile `session`.
    ///
    /// The session's `working` copy is never touched; only its `pristine`
    /// baseline follows the remote record.
    pub fn apply_snapshot(
        &mut self,
        snapshot: Collection,
        session: &mut EditSession,
    ) -> SnapshotOutcome {
        self.hidden.retain(|key| snapshot.contains_key(key));
        self.records = snapshot;
        self.last_error = None;
        self.snapshots_applied += 1;

        let rebase = match session.target().cloned() {
            None => RebaseOutcome::Idle,
            Some(target) => session.rebase(self.records.get(&target)),
        };

        SnapshotOutcome {
            records: self.visible_len(),
            rebase,
        }
    }

    /// Record a failed delivery. The current view stays in place.
    pub fn record_failure(&mut self, error: SubscriptionError) {
        self.last_error = Some(error);
    }

    pub fn last_error(&self) -> Option<&SubscriptionError> {
        self.last_error.as_ref()
    }

    /// Whether any snapshot has arrived yet.
    pub fn is_loaded(&self) -> bool {
        self.snapshots_applied > 0
    }

    pub fn snapshots_applied(&self) -> u64 {
        self.snapshots_applied
    }

    /// A visible record by key.
    pub fn get(&self, key: &Key) -> Option<&Record> {
        if self.hidden.contains(key) {
            return None;
        }
        self.records.get(key)
    }

    /// The present local state, minus optimistically removed records.
    pub fn current_view(&self) -> Collection {
        self.records
            .iter()
            .filter(|(k, _)| !self.hidden.contains(*k))
            .map(|(k, r)| (k.clone(), r.clone()))
            .collect()
    }

    /// Visible records in display order.
    pub fn ordered(&self) -> Vec<Row> {
        ordered_rows(&self.current_view(), self.order_by.as_deref())
    }

    pub fn visible_len(&self) -> usize {
        self.records
            .keys()
            .filter(|k| !self.hidden.contains(*k))
            .count()
    }

    /// Hide `key` ahead of a delete acknowledgement. Returns `false` when the
    /// key is not present.
    pub fn hide(&mut self, key: &Key) -> bool {
        if !self.records.contains_key(key) {
            return false;
        }
        self.hidden.insert(key.clone())
    }

    /// Undo [`hide`](Self::hide) after a failed delete.
    pub fn unhide(&mut self, key: &Key) -> bool {
        self.hidden.remove(key)
    }

    pub fn is_hidden(&self, key: &Key) -> bool {
        self.hidden.contains(key)
    }
}

/// Rows of `collection` in display order.
pub fn ordered_rows(collection: &Collection, order_by: Option<&str>) -> Vec<Row> {
    let mut rows: Vec<Row> = collection
        .iter()
        .map(|(k, r)| Row {
            key: k.clone(),
            record: r.clone(),
        })
        .collect();
    rows.sort_by(|a, b| compare_rows(order_by, a, b));
    rows
}

/// Order by the `order_by` field (numbers before text, missing values last),
/// then by key.
fn compare_rows(order_by: Option<&str>, a: &Row, b: &Row) -> Ordering {
    if let Some(field) = order_by {
        let ord = compare_values(a.record.get(field), b.record.get(field));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.key.cmp(&b.key)
}

fn compare_values(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(FieldValue::Number(x)), Some(FieldValue::Number(y))) => x.total_cmp(y),
        (Some(FieldValue::Number(_)), Some(FieldValue::Text(_))) => Ordering::Less,
        (Some(FieldValue::Text(_)), Some(FieldValue::Number(_))) => Ordering::Greater,
        (Some(FieldValue::Text(x)), Some(FieldValue::Text(y))) => x.cmp(y),
    }
}
