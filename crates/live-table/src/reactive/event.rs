//! Events emitted by a `LiveTable` and the transient notifications it raises.

use crate::{
    error::OperationKind,
    types::Key,
};

/// Correlation id tying a pending operation to its notifications and events.
pub type OperationId = u64;

/// A state change inside a live table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    /// A remote snapshot replaced the local view.
    SnapshotApplied { collection: String, records: usize },
    /// The snapshot stream failed; the previous view is still shown.
    SubscriptionFailed { collection: String, error: String },
    /// The record under edit changed remotely; its pristine copy was refreshed
    /// and the working copy left alone.
    EditRebased { collection: String, key: Key },
    /// The record under edit disappeared from the remote collection.
    EditAbandoned { collection: String, key: Key },
    EditStarted { collection: String, key: Key },
    EditCancelled { collection: String, key: Key },
    /// A save was acknowledged and the session closed.
    EditCommitted { collection: String, key: Key },
    WriteStarted {
        collection: String,
        operation: OperationKind,
        id: OperationId,
        key: Option<Key>,
    },
    WriteFinished {
        collection: String,
        operation: OperationKind,
        id: OperationId,
        key: Option<Key>,
        error: Option<String>,
    },
}

impl TableEvent {
    /// The collection that was affected.
    pub fn collection(&self) -> &str {
        match self {
            Self::SnapshotApplied { collection, .. }
            | Self::SubscriptionFailed { collection, .. }
            | Self::EditRebased { collection, .. }
            | Self::EditAbandoned { collection, .. }
            | Self::EditStarted { collection, .. }
            | Self::EditCancelled { collection, .. }
            | Self::EditCommitted { collection, .. }
            | Self::WriteStarted { collection, .. }
            | Self::WriteFinished { collection, .. } => collection,
        }
    }
}

/// Visual weight of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationVariant {
    Success,
    Destructive,
}

/// A transient, toast-style message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
    /// The operation that raised it, if any. Subscription failures have none.
    pub operation: Option<OperationId>,
}

impl Notification {
    pub fn success(description: impl Into<String>, operation: Option<OperationId>) -> Self {
        Self {
            title: "Success".to_string(),
            description: description.into(),
            variant: NotificationVariant::Success,
            operation,
        }
    }

    pub fn error(
        title: impl Into<String>,
        description: impl Into<String>,
        operation: Option<OperationId>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NotificationVariant::Destructive,
            operation,
        }
    }
}
