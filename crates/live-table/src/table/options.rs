use std::fmt;
use std::sync::Arc;

use crate::dispatch::ErrorCallback;

// ============================================================================
// DeletePolicy
// ============================================================================

/// When a deleted record leaves the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Keep the record visible until a snapshot without it arrives.
    #[default]
    Pessimistic,
    /// Hide the record as soon as the delete is issued and restore it if the
    /// write fails.
    Optimistic,
}

// ============================================================================
// LiveTableOptions
// ============================================================================

#[derive(Clone, Default)]
pub struct LiveTableOptions {
    /// Defaults to [`DeletePolicy::Pessimistic`].
    pub delete_policy: Option<DeletePolicy>,
    /// Raise a "Success" notification after each acknowledged write.
    /// Defaults to `true`.
    pub notify_success: Option<bool>,
    /// Called for validation, write and subscription failures.
    pub on_error: Option<Arc<ErrorCallback>>,
}

impl LiveTableOptions {
    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy.unwrap_or_default()
    }

    pub fn notify_success(&self) -> bool {
        self.notify_success.unwrap_or(true)
    }
}

impl fmt::Debug for LiveTableOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveTableOptions")
            .field("delete_policy", &self.delete_policy)
            .field("notify_success", &self.notify_success)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
