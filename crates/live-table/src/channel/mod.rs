//! Remote collection channel: the store contract and an in-memory store.

pub mod memory;
pub mod types;

pub use memory::{generate_key, InMemoryChannel, KeyGenerator};
pub use types::{
    snapshot_channel, RemoteCollectionChannel, SnapshotDelivery, SnapshotSender, Subscription,
};
