//! Operation bookkeeping types.

use chrono::{DateTime, Utc};

use crate::{error::OperationKind, reactive::OperationId, types::Key};

/// One in-flight create/update/delete.
///
/// Exists only between the write being issued and its resolution; the
/// dispatcher holds at most one per collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
    /// Correlates notifications and events with the originating intent.
    pub id: OperationId,
    pub kind: OperationKind,
    /// Target record. `None` for creates, whose key is not known yet.
    pub key: Option<Key>,
    pub started_at: DateTime<Utc>,
}

/// How a pending operation resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Success,
    Failure(String),
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Callback for write and validation failures, fired after the notification.
pub type ErrorCallback = dyn Fn(&crate::error::LiveTableError) + Send + Sync;
