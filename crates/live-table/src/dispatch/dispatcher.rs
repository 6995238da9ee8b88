//! CommandDispatcher: the only component that writes to the channel.
//!
//! Every write runs under a collection-scoped busy flag. A second write
//! issued while one is outstanding is rejected with `Busy`, never queued.
//! The flag is released by a guard, so a write future that is dropped
//! mid-flight clears it as well.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
    channel::{RemoteCollectionChannel, Subscription},
    error::{ChannelError, LiveTableError, OperationKind, Result, ValidationErrors, WriteError},
    reactive::{EventEmitter, Notification, OperationId, TableEvent},
    schema::EntitySchema,
    types::{Key, Record},
};

use super::types::{ErrorCallback, OperationOutcome, PendingOperation};

// ============================================================================
// Busy guard
// ============================================================================

/// Holds the busy flag for one write. Dropping it clears the flag and the
/// pending operation.
struct BusyGuard<'a> {
    dispatcher: &'a CommandDispatcher,
    id: OperationId,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut pending = self.dispatcher.pending.lock();
        if pending.as_ref().map(|op| op.id) == Some(self.id) {
            *pending = None;
        }
        drop(pending);
        self.dispatcher.busy.store(false, Ordering::Release);
    }
}

// ============================================================================
// CommandDispatcher
// ============================================================================

pub struct CommandDispatcher {
    channel: Arc<dyn RemoteCollectionChannel>,
    schema: Arc<EntitySchema>,
    busy: AtomicBool,
    pending: Mutex<Option<PendingOperation>>,
    next_id: AtomicU64,
    events: Arc<EventEmitter<TableEvent>>,
    notifications: Arc<EventEmitter<Notification>>,
    notify_success: bool,
    on_error: Option<Arc<ErrorCallback>>,
}

impl CommandDispatcher {
    pub fn new(
        channel: Arc<dyn RemoteCollectionChannel>,
        schema: Arc<EntitySchema>,
        events: Arc<EventEmitter<TableEvent>>,
        notifications: Arc<EventEmitter<Notification>>,
    ) -> Self {
        Self {
            channel,
            schema,
            busy: AtomicBool::new(false),
            pending: Mutex::new(None),
            next_id: AtomicU64::new(1),
            events,
            notifications,
            notify_success: true,
            on_error: None,
        }
    }

    /// Whether successful writes raise a notification. Defaults to `true`.
    pub fn with_success_notifications(mut self, enabled: bool) -> Self {
        self.notify_success = enabled;
        self
    }

    pub fn with_error_callback(mut self, on_error: Option<Arc<ErrorCallback>>) -> Self {
        self.on_error = on_error;
        self
    }

    pub fn collection(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    /// Whether a write for this collection is outstanding.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// The outstanding write, if any.
    pub fn pending(&self) -> Option<PendingOperation> {
        self.pending.lock().clone()
    }

    /// Open a snapshot stream for this collection.
    pub fn subscribe(&self) -> Result<Subscription> {
        self.channel
            .subscribe(self.collection())
            .map_err(LiveTableError::from)
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Validate `draft` and store it under a newly assigned key.
    ///
    /// Absent optional fields are filled with their defaults first. An
    /// invalid draft fails locally and nothing is written.
    pub async fn create(&self, draft: Record) -> Result<Key> {
        let record = self.schema.normalize(&draft);
        self.check(self.schema.validate(&record))?;

        let guard = self.claim(OperationKind::Create, None)?;
        let result = self.channel.create(self.collection(), record).await;
        match result {
            Ok(key) => {
                self.succeed(&guard, OperationKind::Create, Some(&key));
                Ok(key)
            }
            Err(source) => Err(self.fail(&guard, OperationKind::Create, None, source)),
        }
    }

    /// Write `working` over the record stored under `key`.
    ///
    /// The whole working copy is sent as the partial update, so fields the
    /// user left alone are rewritten with the values they were edited from.
    /// Only declared fields are validated; anything else the stored record
    /// carries is written back as it was.
    pub async fn save(&self, key: &Key, working: Record) -> Result<()> {
        self.check(self.schema.validate_edit(&working))?;

        let guard = self.claim(OperationKind::Update, Some(key))?;
        let result = self.channel.update(self.collection(), key, working).await;
        match result {
            Ok(()) => {
                self.succeed(&guard, OperationKind::Update, Some(key));
                Ok(())
            }
            Err(source) => Err(self.fail(&guard, OperationKind::Update, Some(key), source)),
        }
    }

    /// Remove the record stored under `key`. Without `confirmed` nothing is
    /// written and `ConfirmationRequired` is returned.
    pub async fn delete(&self, key: &Key, confirmed: bool) -> Result<()> {
        if !confirmed {
            debug!(
                target: "live_table::dispatch",
                collection = self.collection(),
                key = %key,
                "delete not confirmed"
            );
            return Err(LiveTableError::ConfirmationRequired { key: key.clone() });
        }

        let guard = self.claim(OperationKind::Delete, Some(key))?;
        let result = self.channel.delete(self.collection(), key).await;
        match result {
            Ok(()) => {
                self.succeed(&guard, OperationKind::Delete, Some(key));
                Ok(())
            }
            Err(source) => Err(self.fail(&guard, OperationKind::Delete, Some(key), source)),
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Raise a "Validation Error" notification for a failed validation.
    fn check(&self, validated: Result<(), ValidationErrors>) -> Result<()> {
        if let Err(errors) = validated {
            debug!(
                target: "live_table::dispatch",
                collection = self.collection(),
                fields = ?errors.fields(),
                "validation failed"
            );
            self.notifications.emit(&Notification::error(
                "Validation Error",
                validation_message(&errors),
                None,
            ));
            let err = LiveTableError::Validation(errors);
            self.report(&err);
            return Err(err);
        }
        Ok(())
    }

    /// Claim the busy flag and register the pending operation.
    fn claim(&self, kind: OperationKind, key: Option<&Key>) -> Result<BusyGuard<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(
                target: "live_table::dispatch",
                collection = self.collection(),
                operation = %kind,
                "rejected: write outstanding"
            );
            return Err(LiveTableError::Busy {
                collection: self.collection().to_string(),
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        *self.pending.lock() = Some(PendingOperation {
            id,
            kind,
            key: key.cloned(),
            started_at: chrono::Utc::now(),
        });
        debug!(
            target: "live_table::dispatch",
            collection = self.collection(),
            operation = %kind,
            id,
            "write started"
        );
        self.events.emit(&TableEvent::WriteStarted {
            collection: self.collection().to_string(),
            operation: kind,
            id,
            key: key.cloned(),
        });
        Ok(BusyGuard {
            dispatcher: self,
            id,
        })
    }

    fn succeed(&self, guard: &BusyGuard<'_>, kind: OperationKind, key: Option<&Key>) {
        info!(
            target: "live_table::dispatch",
            collection = self.collection(),
            operation = %kind,
            id = guard.id,
            key = ?key.map(Key::as_str),
            "write acknowledged"
        );
        self.finish(guard.id, kind, key, &OperationOutcome::Success);
        if self.notify_success {
            self.notifications.emit(&Notification::success(
                format!("{} {} successfully", self.schema.label, past_tense(kind)),
                Some(guard.id),
            ));
        }
    }

    fn fail(
        &self,
        guard: &BusyGuard<'_>,
        kind: OperationKind,
        key: Option<&Key>,
        source: ChannelError,
    ) -> LiveTableError {
        warn!(
            target: "live_table::dispatch",
            collection = self.collection(),
            operation = %kind,
            id = guard.id,
            error = %source,
            "write failed"
        );
        let reason = source.to_string();
        self.finish(
            guard.id,
            kind,
            key,
            &OperationOutcome::Failure(reason.clone()),
        );
        self.notifications.emit(&Notification::error(
            "Error",
            format!(
                "Failed to {kind} {}: {reason}",
                self.schema.label.to_lowercase()
            ),
            Some(guard.id),
        ));
        let err = LiveTableError::Write(WriteError {
            operation: kind,
            collection: self.collection().to_string(),
            key: key.cloned(),
            source,
        });
        self.report(&err);
        err
    }

    fn finish(
        &self,
        id: OperationId,
        kind: OperationKind,
        key: Option<&Key>,
        outcome: &OperationOutcome,
    ) {
        let error = match outcome {
            OperationOutcome::Success => None,
            OperationOutcome::Failure(reason) => Some(reason.clone()),
        };
        self.events.emit(&TableEvent::WriteFinished {
            collection: self.collection().to_string(),
            operation: kind,
            id,
            key: key.cloned(),
            error,
        });
    }

    fn report(&self, err: &LiveTableError) {
        if let Some(cb) = &self.on_error {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cb(err)));
        }
    }
}

fn past_tense(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Create => "created",
        OperationKind::Update => "updated",
        OperationKind::Delete => "deleted",
    }
}

/// "Please fill in all required fields" when only required fields are
/// missing or blank, otherwise one line per offending field.
fn validation_message(errors: &ValidationErrors) -> String {
    let all_missing = errors
        .0
        .iter()
        .all(|e| e.received == "missing" || e.received == "empty text");
    if all_missing {
        return format!(
            "Please fill in all required fields: {}",
            errors.fields().join(", ")
        );
    }
    errors
        .0
        .iter()
        .map(|e| format!("{}: expected {}, received {}", e.field, e.expected, e.received))
        .collect::<Vec<_>>()
        .join("; ")
}
