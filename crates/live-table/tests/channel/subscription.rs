//! Tests for `Subscription` lifecycle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use live_table::channel::{snapshot_channel, Subscription};
use live_table::types::Collection;

fn counting_subscription() -> (Subscription, live_table::channel::SnapshotSender, Arc<AtomicUsize>) {
    let (tx, rx) = snapshot_channel();
    let released = Arc::new(AtomicUsize::new(0));
    let released_clone = Arc::clone(&released);
    let sub = Subscription::new(
        "batches",
        rx,
        Box::new(move || {
            released_clone.fetch_add(1, Ordering::SeqCst);
        }),
    );
    (sub, tx, released)
}

#[tokio::test]
async fn deliveries_arrive_in_send_order() {
    let (mut sub, tx, _) = counting_subscription();
    let mut second = Collection::new();
    second.insert("k".into(), Default::default());

    assert!(tx.send(Ok(Collection::new())));
    assert!(tx.send(Ok(second.clone())));

    assert!(sub.next().await.unwrap().unwrap().is_empty());
    assert_eq!(sub.next().await.unwrap().unwrap(), second);
}

#[tokio::test]
async fn unsubscribe_releases_once_and_ends_stream() {
    let (mut sub, tx, released) = counting_subscription();
    tx.send(Ok(Collection::new()));

    sub.unsubscribe();
    sub.unsubscribe();

    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert!(!sub.is_active());
    assert!(sub.next().await.is_none());
    assert!(!tx.send(Ok(Collection::new())));
    assert!(tx.is_closed());
}

#[test]
fn drop_releases() {
    let (sub, _tx, released) = counting_subscription();
    assert_eq!(sub.collection(), "batches");
    drop(sub);
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stream_ends_when_sender_is_dropped() {
    let (mut sub, tx, released) = counting_subscription();
    drop(tx);
    assert!(sub.next().await.is_none());
    assert_eq!(released.load(Ordering::SeqCst), 0);
}
