//! In-memory `RemoteCollectionChannel`.
//!
//! Behaves like a push-based document store: subscribing delivers the current
//! collection immediately, and every successful write broadcasts a fresh
//! whole-collection snapshot to every live subscriber of that collection.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{ChannelError, SubscriptionError},
    types::{collection_from_json, Collection, Key, Record},
};

use super::types::{snapshot_channel, RemoteCollectionChannel, SnapshotSender, Subscription};

/// Generate a random record key (UUID v4).
pub fn generate_key() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Key generator function type.
pub type KeyGenerator = dyn Fn() -> String + Send + Sync;

struct ChannelState {
    collections: HashMap<String, Collection>,
    subscribers: HashMap<String, Vec<(u64, SnapshotSender)>>,
    next_subscriber: u64,
}

impl ChannelState {
    /// Send the current snapshot of `collection` to its subscribers, dropping
    /// any whose receiving end has gone away.
    fn broadcast(&mut self, collection: &str) {
        let snapshot = self.collections.get(collection).cloned().unwrap_or_default();
        if let Some(subs) = self.subscribers.get_mut(collection) {
            subs.retain(|(_, tx)| tx.send(Ok(snapshot.clone())));
        }
    }
}

pub struct InMemoryChannel {
    state: Arc<Mutex<ChannelState>>,
    generate_key: Arc<KeyGenerator>,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::with_key_generator(Arc::new(generate_key))
    }

    /// Use `generate_key` instead of random UUIDs for new records.
    pub fn with_key_generator(generate_key: Arc<KeyGenerator>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChannelState {
                collections: HashMap::new(),
                subscribers: HashMap::new(),
                next_subscriber: 1,
            })),
            generate_key,
        }
    }

    /// Replace the contents of `collection` and notify subscribers.
    pub fn seed(&self, collection: &str, records: Collection) {
        let mut st = self.state.lock();
        st.collections.insert(collection.to_string(), records);
        st.broadcast(collection);
    }

    /// [`seed`](Self::seed) from a JSON object of record objects.
    pub fn seed_json(&self, collection: &str, value: &Value) -> Result<(), SubscriptionError> {
        let records = collection_from_json(value).map_err(|reason| SubscriptionError::Malformed {
            collection: collection.to_string(),
            reason,
        })?;
        self.seed(collection, records);
        Ok(())
    }

    /// Current stored contents of `collection`.
    pub fn snapshot(&self, collection: &str) -> Collection {
        self.state
            .lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of live subscriptions on `collection`.
    pub fn subscriber_count(&self, collection: &str) -> usize {
        let st = self.state.lock();
        st.subscribers
            .get(collection)
            .map(|subs| subs.iter().filter(|(_, tx)| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// Push a stream failure to every subscriber of `collection`, as a store
    /// does when read access is revoked. Subscriptions stay registered.
    pub fn fail_subscriptions(&self, collection: &str, error: ChannelError) {
        let mut st = self.state.lock();
        if let Some(subs) = st.subscribers.get_mut(collection) {
            subs.retain(|(_, tx)| {
                tx.send(Err(SubscriptionError::Channel {
                    collection: collection.to_string(),
                    source: error.clone(),
                }))
            });
        }
    }
}

impl Default for InMemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

fn release_hook(state: Weak<Mutex<ChannelState>>, collection: String, id: u64) -> crate::reactive::Unsubscribe {
    Box::new(move || {
        if let Some(state) = state.upgrade() {
            let mut st = state.lock();
            if let Some(subs) = st.subscribers.get_mut(&collection) {
                subs.retain(|(sid, _)| *sid != id);
                if subs.is_empty() {
                    st.subscribers.remove(&collection);
                }
            }
        }
    })
}

#[async_trait]
impl RemoteCollectionChannel for InMemoryChannel {
    fn subscribe(&self, collection: &str) -> Result<Subscription, ChannelError> {
        let (tx, rx) = snapshot_channel();
        let id = {
            let mut st = self.state.lock();
            let id = st.next_subscriber;
            st.next_subscriber += 1;
            let current = st.collections.get(collection).cloned().unwrap_or_default();
            tx.send(Ok(current));
            st.subscribers
                .entry(collection.to_string())
                .or_default()
                .push((id, tx));
            id
        };
        debug!(target: "live_table::channel", collection, subscriber = id, "subscribed");
        let release = release_hook(Arc::downgrade(&self.state), collection.to_string(), id);
        Ok(Subscription::new(collection, rx, release))
    }

    async fn create(&self, collection: &str, record: Record) -> Result<Key, ChannelError> {
        let key = Key::new((self.generate_key)());
        let mut st = self.state.lock();
        st.collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.clone(), record);
        st.broadcast(collection);
        Ok(key)
    }

    async fn update(
        &self,
        collection: &str,
        key: &Key,
        partial: Record,
    ) -> Result<(), ChannelError> {
        let mut st = self.state.lock();
        let record = st
            .collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(key))
            .ok_or_else(|| ChannelError::NotFound {
                collection: collection.to_string(),
                key: key.clone(),
            })?;
        record.merge(&partial);
        st.broadcast(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &Key) -> Result<(), ChannelError> {
        let mut st = self.state.lock();
        let removed = st
            .collections
            .get_mut(collection)
            .and_then(|c| c.remove(key));
        if removed.is_none() {
            return Err(ChannelError::NotFound {
                collection: collection.to_string(),
                key: key.clone(),
            });
        }
        st.broadcast(collection);
        Ok(())
    }
}
