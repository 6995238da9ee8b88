//! Tests for `CollectionMirror`.

use live_table::edit::{ordered_rows, CollectionMirror, EditSession, RebaseOutcome};
use live_table::entities;
use live_table::error::{ChannelError, SubscriptionError};
use live_table::types::{Collection, Key, Record};

fn batch(id: &str, completion: i64) -> Record {
    Record::new()
        .with("batchId", id)
        .with("product", "Serum")
        .with("startDate", "2024-01-01")
        .with("completion", completion)
        .with("status", "In Progress")
}

fn snapshot(rows: &[(&str, Record)]) -> Collection {
    rows.iter()
        .map(|(k, r)| (Key::new(*k), r.clone()))
        .collect()
}

fn mirror() -> CollectionMirror {
    CollectionMirror::for_schema(&entities::batches())
}

#[test]
fn snapshot_replaces_view_entirely() {
    let mut m = mirror();
    let mut session = EditSession::new();
    assert!(!m.is_loaded());

    m.apply_snapshot(snapshot(&[("a", batch("B-1", 0)), ("b", batch("B-2", 0))]), &mut session);
    let outcome = m.apply_snapshot(snapshot(&[("c", batch("B-3", 0))]), &mut session);

    assert_eq!(outcome.records, 1);
    assert_eq!(outcome.rebase, RebaseOutcome::Idle);
    assert_eq!(m.current_view().len(), 1);
    assert!(m.get(&Key::new("a")).is_none());
    assert_eq!(m.snapshots_applied(), 2);
    assert!(m.is_loaded());
}

#[test]
fn snapshot_never_clobbers_working() {
    let schema = entities::batches();
    let mut m = mirror();
    let mut session = EditSession::new();
    m.apply_snapshot(snapshot(&[("a", batch("B-1", 10))]), &mut session);

    session.start(Key::new("a"), m.get(&Key::new("a")).unwrap()).unwrap();
    session.set_field(&schema, "completion", 50.into()).unwrap();
    let working = session.active().unwrap().working.clone();

    let remote = batch("B-1", 10).with("product", "Serum v2");
    let outcome = m.apply_snapshot(snapshot(&[("a", remote.clone())]), &mut session);

    assert_eq!(outcome.rebase, RebaseOutcome::Rebased(Key::new("a")));
    let edit = session.active().unwrap();
    assert_eq!(edit.working, working);
    assert_eq!(edit.pristine, remote);
    // The mirror itself shows the remote value.
    assert_eq!(m.get(&Key::new("a")), Some(&remote));
}

#[test]
fn clean_session_working_is_also_left_alone() {
    let mut m = mirror();
    let mut session = EditSession::new();
    m.apply_snapshot(snapshot(&[("a", batch("B-1", 10))]), &mut session);
    session.start(Key::new("a"), &batch("B-1", 10)).unwrap();

    m.apply_snapshot(snapshot(&[("a", batch("B-1", 20))]), &mut session);

    let edit = session.active().unwrap();
    assert_eq!(edit.working, batch("B-1", 10));
    assert_eq!(edit.pristine, batch("B-1", 20));
    assert!(session.is_dirty());
}

#[test]
fn removed_target_abandons_session() {
    let mut m = mirror();
    let mut session = EditSession::new();
    m.apply_snapshot(snapshot(&[("a", batch("B-1", 10))]), &mut session);
    session.start(Key::new("a"), &batch("B-1", 10)).unwrap();

    let outcome = m.apply_snapshot(Collection::new(), &mut session);

    assert_eq!(outcome.rebase, RebaseOutcome::Abandoned(Key::new("a")));
    assert!(!session.is_editing());
}

#[test]
fn failure_keeps_last_good_view() {
    let mut m = mirror();
    let mut session = EditSession::new();
    m.apply_snapshot(snapshot(&[("a", batch("B-1", 10))]), &mut session);

    m.record_failure(SubscriptionError::Channel {
        collection: "batches".into(),
        source: ChannelError::Transport("offline".into()),
    });

    assert_eq!(m.current_view().len(), 1);
    assert!(m.last_error().is_some());

    m.apply_snapshot(snapshot(&[("a", batch("B-1", 10))]), &mut session);
    assert!(m.last_error().is_none());
}

#[test]
fn hidden_records_leave_view_until_confirmed() {
    let mut m = mirror();
    let mut session = EditSession::new();
    m.apply_snapshot(snapshot(&[("a", batch("B-1", 0)), ("b", batch("B-2", 0))]), &mut session);

    assert!(m.hide(&Key::new("a")));
    assert!(!m.hide(&Key::new("zzz")));
    assert!(m.get(&Key::new("a")).is_none());
    assert_eq!(m.visible_len(), 1);

    // A snapshot that still has the record keeps it hidden.
    m.apply_snapshot(snapshot(&[("a", batch("B-1", 0)), ("b", batch("B-2", 0))]), &mut session);
    assert!(m.is_hidden(&Key::new("a")));

    // Once removal is confirmed the marker goes away.
    m.apply_snapshot(snapshot(&[("b", batch("B-2", 0))]), &mut session);
    assert!(!m.is_hidden(&Key::new("a")));
}

#[test]
fn unhide_restores_record() {
    let mut m = mirror();
    let mut session = EditSession::new();
    m.apply_snapshot(snapshot(&[("a", batch("B-1", 0))]), &mut session);
    m.hide(&Key::new("a"));
    assert!(m.unhide(&Key::new("a")));
    assert!(m.get(&Key::new("a")).is_some());
}

// ============================================================================
// Display order
// ============================================================================

#[test]
fn order_follows_field_not_arrival() {
    let mut m = mirror();
    let mut session = EditSession::new();
    m.apply_snapshot(
        snapshot(&[("z", batch("B-1", 0)), ("a", batch("B-3", 0)), ("m", batch("B-2", 0))]),
        &mut session,
    );

    let ids: Vec<String> = m
        .ordered()
        .into_iter()
        .map(|r| r.record.get("batchId").unwrap().display())
        .collect();
    assert_eq!(ids, vec!["B-1", "B-2", "B-3"]);
}

#[test]
fn ties_and_missing_values_order_by_key() {
    let rows = ordered_rows(
        &snapshot(&[
            ("b", Record::new().with("n", 1)),
            ("a", Record::new().with("n", 1)),
            ("c", Record::new()),
            ("d", Record::new().with("n", "text")),
        ]),
        Some("n"),
    );
    let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["a", "b", "d", "c"]);
}

#[test]
fn no_order_field_orders_by_key() {
    let rows = ordered_rows(
        &snapshot(&[("b", Record::new()), ("a", Record::new())]),
        None,
    );
    assert_eq!(rows[0].key, Key::new("a"));
}
