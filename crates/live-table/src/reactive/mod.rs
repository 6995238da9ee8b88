//! Reactive layer: synchronous listeners over table state.
//!
//! # Modules
//!
//! - [`event`]: [`TableEvent`] and [`Notification`].
//! - [`event_emitter`]: generic typed pub/sub ([`EventEmitter<T>`]).

pub mod event;
pub mod event_emitter;

pub use event::{Notification, NotificationVariant, OperationId, TableEvent};
pub use event_emitter::{EventEmitter, ListenerId, Unsubscribe};
