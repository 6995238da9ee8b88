//! Channel contract: the remote store the engine mirrors.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{
    error::{ChannelError, SubscriptionError},
    reactive::Unsubscribe,
    types::{Collection, Key, Record},
};

// ============================================================================
// RemoteCollectionChannel: user-provided store adapter
// ============================================================================

/// A remote store of keyed record collections.
///
/// Subscribers receive the *whole* collection on every change. There are no
/// deltas, no ordering tokens and no write acknowledgements beyond the
/// returned future; last write wins at the store.
#[async_trait]
pub trait RemoteCollectionChannel: Send + Sync {
    /// Start a snapshot stream for `collection`. The stream ends when the
    /// returned [`Subscription`] is unsubscribed or dropped.
    fn subscribe(&self, collection: &str) -> Result<Subscription, ChannelError>;

    /// Store `record` under a newly assigned key and return that key.
    async fn create(&self, collection: &str, record: Record) -> Result<Key, ChannelError>;

    /// Merge `partial` into the record stored under `key`.
    async fn update(&self, collection: &str, key: &Key, partial: Record)
        -> Result<(), ChannelError>;

    async fn delete(&self, collection: &str, key: &Key) -> Result<(), ChannelError>;
}

// ============================================================================
// Subscription
// ============================================================================

/// One item of a snapshot stream.
pub type SnapshotDelivery = Result<Collection, SubscriptionError>;

/// Producer half handed to channel implementations.
#[derive(Debug, Clone)]
pub struct SnapshotSender(mpsc::UnboundedSender<SnapshotDelivery>);

impl SnapshotSender {
    /// Queue a delivery. Returns `false` once the subscriber is gone.
    pub fn send(&self, delivery: SnapshotDelivery) -> bool {
        self.0.send(delivery).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

/// Create a connected sender/receiver pair for a new subscription.
pub fn snapshot_channel() -> (SnapshotSender, mpsc::UnboundedReceiver<SnapshotDelivery>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SnapshotSender(tx), rx)
}

/// Consumer half of a snapshot stream.
///
/// Deliveries are yielded in the order the channel sent them. Unsubscribing
/// runs the channel's release hook exactly once and closes the stream, so
/// nothing queued behind it is observed afterwards.
pub struct Subscription {
    collection: String,
    receiver: mpsc::UnboundedReceiver<SnapshotDelivery>,
    release: Option<Unsubscribe>,
}

impl Subscription {
    pub fn new(
        collection: impl Into<String>,
        receiver: mpsc::UnboundedReceiver<SnapshotDelivery>,
        release: Unsubscribe,
    ) -> Self {
        Self {
            collection: collection.into(),
            receiver,
            release: Some(release),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Wait for the next delivery. `None` once the stream is closed.
    pub async fn next(&mut self) -> Option<SnapshotDelivery> {
        if self.release.is_none() {
            return None;
        }
        self.receiver.recv().await
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    /// Release the subscription. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if let Some(release) = self.release.take() {
            self.receiver.close();
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("collection", &self.collection)
            .field("active", &self.is_active())
            .finish()
    }
}
