//! SnapshotPump tests: delivery, failure, teardown.

use std::sync::Arc;

use live_table::entities;
use live_table::error::{ChannelError, LiveTableError, SubscriptionError};
use live_table::table::{LiveTable, LiveTableOptions, PumpStep};
use live_table::types::Key;

use crate::support::{batch, collection, init_tracing, wait_until, Call, MockChannel};

fn setup() -> (Arc<MockChannel>, LiveTable) {
    init_tracing();
    let channel = MockChannel::new();
    let table = LiveTable::new(
        Arc::new(entities::batches()),
        channel.clone(),
        LiveTableOptions::default(),
    );
    (channel, table)
}

#[tokio::test]
async fn attach_subscribes_and_step_applies() {
    let (channel, table) = setup();
    let mut pump = table.attach().unwrap();

    assert!(table.is_attached());
    assert_eq!(pump.collection(), "batches");
    assert_eq!(
        channel.calls(),
        vec![Call::Subscribe {
            collection: "batches".into()
        }]
    );

    channel.push(
        "batches",
        collection([("k1", batch("B-1", "X", "2024-01-01", 0, "In Progress"))]),
    );
    assert_eq!(pump.step().await, PumpStep::Applied);
    assert_eq!(table.view().rows.len(), 1);
}

#[tokio::test]
async fn snapshots_apply_in_delivery_order() {
    let (channel, table) = setup();
    let mut pump = table.attach().unwrap();

    channel.push("batches", collection([("a", batch("B-1", "X", "2024-01-01", 0, "In Progress"))]));
    channel.push("batches", collection([]));
    channel.push("batches", collection([("b", batch("B-2", "Y", "2024-01-01", 5, "On Hold"))]));

    for _ in 0..3 {
        assert_eq!(pump.step().await, PumpStep::Applied);
    }
    let view = table.view();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].key, Key::new("b"));
}

#[tokio::test]
async fn failed_delivery_keeps_view() {
    let (channel, table) = setup();
    let mut pump = table.attach().unwrap();
    channel.push("batches", collection([("a", batch("B-1", "X", "2024-01-01", 0, "In Progress"))]));
    pump.step().await;

    channel.push_error(
        "batches",
        SubscriptionError::Channel {
            collection: "batches".into(),
            source: ChannelError::Transport("dropped".into()),
        },
    );

    assert_eq!(pump.step().await, PumpStep::Failed);
    let view = table.view();
    assert_eq!(view.rows.len(), 1);
    assert!(view.error.is_some());
}

#[tokio::test]
async fn late_snapshot_after_detach_is_discarded() {
    let (channel, table) = setup();
    let mut pump = table.attach().unwrap();
    channel.push("batches", collection([("a", batch("B-1", "X", "2024-01-01", 0, "In Progress"))]));
    pump.step().await;

    table.detach();
    channel.push("batches", collection([]));

    assert_eq!(pump.step().await, PumpStep::Detached);
    assert_eq!(table.view().rows.len(), 1, "late snapshot must not apply");
    assert_eq!(channel.released(), 1);
    assert!(!table.is_attached());

    // Further steps stay detached and do not release twice.
    assert_eq!(pump.step().await, PumpStep::Detached);
    assert_eq!(channel.released(), 1);
}

#[tokio::test]
async fn detach_wakes_a_waiting_pump() {
    let (channel, table) = setup();
    let pump = table.attach().unwrap();
    let handle = pump.spawn();

    tokio::task::yield_now().await;
    table.detach();

    assert_eq!(handle.await.unwrap(), PumpStep::Detached);
    assert_eq!(channel.live_subscriptions(), 0);
}

#[tokio::test]
async fn dropping_the_table_stops_the_pump() {
    let (channel, table) = setup();
    let mut pump = table.attach().unwrap();
    channel.push("batches", collection([]));

    drop(table);

    assert_eq!(pump.step().await, PumpStep::Detached);
    assert_eq!(channel.released(), 1);
}

#[tokio::test]
async fn reattach_supersedes_previous_pump() {
    let (channel, table) = setup();
    let mut old = table.attach().unwrap();
    let mut new = table.attach().unwrap();

    channel.push("batches", collection([("a", batch("B-1", "X", "2024-01-01", 0, "In Progress"))]));

    assert_eq!(old.step().await, PumpStep::Detached);
    assert_eq!(new.step().await, PumpStep::Applied);
    assert!(table.is_attached());
    assert_eq!(table.view().rows.len(), 1);
}

#[tokio::test]
async fn closed_stream_ends_run() {
    let (channel, table) = setup();
    let pump = table.attach().unwrap();
    channel.push("batches", collection([]));
    channel.close("batches");

    assert_eq!(pump.run().await, PumpStep::Closed);
    assert!(table.view().loaded);
}

#[tokio::test]
async fn attach_failure_is_reported() {
    let (channel, table) = setup();
    channel.fail_subscribe(ChannelError::PermissionDenied("no read access".into()));

    let err = table.attach().unwrap_err();

    assert!(matches!(
        err,
        LiveTableError::Channel(ChannelError::PermissionDenied(_))
    ));
    assert!(!table.is_attached());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn spawned_pump_keeps_table_current() {
    let (channel, table) = setup();
    let handle = table.attach().unwrap().spawn();

    channel.push("batches", collection([("a", batch("B-1", "X", "2024-01-01", 0, "In Progress"))]));
    let t = table.clone();
    wait_until(move || t.view().rows.len() == 1).await;

    table.detach();
    assert_eq!(handle.await.unwrap(), PumpStep::Detached);
}
