//! LiveTable: one editable, live view of one remote collection.
//!
//! # Threading model
//!
//! `LiveTable` is `Send + Sync` and cheap to clone. Table state (mirror,
//! edit session, search text) sits behind a single `parking_lot::Mutex`
//! that is never held across an `.await` or while listeners run. The busy
//! flag and pending operation belong to the [`CommandDispatcher`] and are
//! read without taking the state lock.
//!
//! Snapshots reach the table through a [`SnapshotPump`] returned by
//! [`LiveTable::attach`]. Each attach starts a new generation; `detach` (or
//! dropping every handle to the table) ends it, and a pump from an earlier
//! generation discards whatever it receives.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    channel::RemoteCollectionChannel,
    dispatch::{CommandDispatcher, ErrorCallback, PendingOperation},
    edit::{CollectionMirror, EditSession, RebaseOutcome},
    error::{EditError, LiveTableError, Result, SubscriptionError},
    query::{filter_rows, summarize},
    reactive::{EventEmitter, Notification, TableEvent, Unsubscribe},
    schema::EntitySchema,
    types::{Collection, FieldValue, Key, Record},
};

use super::{
    options::{DeletePolicy, LiveTableOptions},
    pump::SnapshotPump,
    view::TableView,
};

// ============================================================================
// Internal state
// ============================================================================

struct TableState {
    mirror: CollectionMirror,
    session: EditSession,
    query: String,
}

pub(crate) struct TableInner {
    schema: Arc<EntitySchema>,
    state: Mutex<TableState>,
    dispatcher: CommandDispatcher,
    delete_policy: DeletePolicy,
    on_error: Option<Arc<ErrorCallback>>,
    renders: Arc<EventEmitter<TableView>>,
    events: Arc<EventEmitter<TableEvent>>,
    notifications: Arc<EventEmitter<Notification>>,
    /// Attach generation. Pumps hold a receiver and stop once it moves on.
    generation: watch::Sender<u64>,
    attached: AtomicBool,
}

impl TableInner {
    fn collection(&self) -> &str {
        &self.schema.name
    }

    pub(crate) fn generation(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    fn view(&self) -> TableView {
        let (rows, total, query, edit, error, loaded, summary) = {
            let st = self.state.lock();
            let visible = st.mirror.current_view();
            let ordered = st.mirror.ordered();
            let total = ordered.len();
            let rows = filter_rows(ordered, &self.schema, &st.query);
            let summary = summarize(&visible, &self.schema, rows.len());
            (
                rows,
                total,
                st.query.clone(),
                st.session.state().clone(),
                st.mirror.last_error().map(|e| e.to_string()),
                st.mirror.is_loaded(),
                summary,
            )
        };
        TableView {
            collection: self.collection().to_string(),
            rows,
            total,
            query,
            edit,
            busy: self.dispatcher.is_busy(),
            pending: self.dispatcher.pending(),
            error,
            loaded,
            summary,
        }
    }

    fn render(&self) {
        if self.renders.is_empty() {
            return;
        }
        let view = self.view();
        self.renders.emit(&view);
    }

    pub(crate) fn apply_snapshot(&self, snapshot: Collection) {
        let outcome = {
            let mut st = self.state.lock();
            let TableState {
                mirror, session, ..
            } = &mut *st;
            mirror.apply_snapshot(snapshot, session)
        };

        debug!(
            target: "live_table::table",
            collection = self.collection(),
            records = outcome.records,
            "snapshot applied"
        );
        self.events.emit(&TableEvent::SnapshotApplied {
            collection: self.collection().to_string(),
            records: outcome.records,
        });

        match outcome.rebase {
            RebaseOutcome::Rebased(key) => {
                info!(
                    target: "live_table::table",
                    collection = self.collection(),
                    key = %key,
                    "record under edit changed remotely; working copy kept"
                );
                self.events.emit(&TableEvent::EditRebased {
                    collection: self.collection().to_string(),
                    key,
                });
            }
            RebaseOutcome::Abandoned(key) => {
                warn!(
                    target: "live_table::table",
                    collection = self.collection(),
                    key = %key,
                    "record under edit was removed remotely; edit closed"
                );
                self.events.emit(&TableEvent::EditAbandoned {
                    collection: self.collection().to_string(),
                    key,
                });
            }
            RebaseOutcome::Idle | RebaseOutcome::Unchanged => {}
        }

        self.render();
    }

    pub(crate) fn apply_failure(&self, error: SubscriptionError) {
        warn!(
            target: "live_table::table",
            collection = self.collection(),
            error = %error,
            "snapshot stream failed; keeping last view"
        );
        self.state.lock().mirror.record_failure(error.clone());
        self.events.emit(&TableEvent::SubscriptionFailed {
            collection: self.collection().to_string(),
            error: error.to_string(),
        });
        self.notifications.emit(&Notification::error(
            "Error",
            format!("Failed to load {}: {error}", self.collection()),
            None,
        ));
        self.report(&LiveTableError::Subscription(error));
        self.render();
    }

    fn report(&self, err: &LiveTableError) {
        if let Some(cb) = &self.on_error {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cb(err)));
        }
    }

    fn reject(&self, intent: &str, err: LiveTableError) -> LiveTableError {
        debug!(
            target: "live_table::table",
            collection = self.collection(),
            intent,
            error = %err,
            "intent rejected"
        );
        err
    }

    fn ensure_not_busy(&self, intent: &str) -> Result<()> {
        if self.dispatcher.is_busy() {
            return Err(self.reject(
                intent,
                LiveTableError::Busy {
                    collection: self.collection().to_string(),
                },
            ));
        }
        Ok(())
    }
}

/// Shows an optimistically deleted record again unless disarmed, including
/// when the delete future is dropped before it resolves.
struct HiddenRow<'a> {
    inner: &'a TableInner,
    key: Key,
    armed: bool,
}

impl Drop for HiddenRow<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.inner.state.lock().mirror.unhide(&self.key);
        }
    }
}

/// Reopens the edit session if the save future is dropped before the store
/// answers. Disarmed once the outcome has been recorded.
struct PendingSave<'a> {
    inner: &'a TableInner,
    key: Key,
    armed: bool,
}

impl Drop for PendingSave<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let reopened = self
            .inner
            .state
            .lock()
            .session
            .interrupt_save(&self.key, "save was interrupted before the store answered");
        if reopened {
            warn!(
                target: "live_table::table",
                collection = self.inner.collection(),
                key = %self.key,
                "save dropped in flight; edit session reopened"
            );
            self.inner.render();
        }
    }
}

// ============================================================================
// LiveTable
// ============================================================================

#[derive(Clone)]
pub struct LiveTable {
    inner: Arc<TableInner>,
}

impl LiveTable {
    pub fn new(
        schema: Arc<EntitySchema>,
        channel: Arc<dyn RemoteCollectionChannel>,
        options: LiveTableOptions,
    ) -> Self {
        let events = Arc::new(EventEmitter::new());
        let notifications = Arc::new(EventEmitter::new());
        let dispatcher = CommandDispatcher::new(
            channel,
            Arc::clone(&schema),
            Arc::clone(&events),
            Arc::clone(&notifications),
        )
        .with_success_notifications(options.notify_success())
        .with_error_callback(options.on_error.clone());

        let inner = Arc::new_cyclic(|weak: &Weak<TableInner>| {
            // Re-render when a write starts so views see the busy flag.
            let weak = weak.clone();
            events.on(move |event: &TableEvent| {
                if let TableEvent::WriteStarted { .. } = event {
                    if let Some(inner) = weak.upgrade() {
                        inner.render();
                    }
                }
            });

            let (generation, _) = watch::channel(0);
            TableInner {
                state: Mutex::new(TableState {
                    mirror: CollectionMirror::for_schema(&schema),
                    session: EditSession::new(),
                    query: String::new(),
                }),
                schema,
                dispatcher,
                delete_policy: options.delete_policy(),
                on_error: options.on_error,
                renders: Arc::new(EventEmitter::new()),
                events,
                notifications,
                generation,
                attached: AtomicBool::new(false),
            }
        });

        Self { inner }
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.inner.schema
    }

    pub fn collection(&self) -> &str {
        self.inner.collection()
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.inner.delete_policy
    }

    // -----------------------------------------------------------------------
    // Projection
    // -----------------------------------------------------------------------

    /// The current projection.
    pub fn view(&self) -> TableView {
        self.inner.view()
    }

    /// Mirror contents, minus optimistically deleted records.
    pub fn current_view(&self) -> Collection {
        self.inner.state.lock().mirror.current_view()
    }

    pub fn is_busy(&self) -> bool {
        self.inner.dispatcher.is_busy()
    }

    pub fn pending(&self) -> Option<PendingOperation> {
        self.inner.dispatcher.pending()
    }

    /// Call `callback` with a fresh view after every state change.
    pub fn on_render(&self, callback: impl Fn(&TableView) + Send + Sync + 'static) -> Unsubscribe {
        self.inner.renders.subscribe(callback)
    }

    pub fn on_event(&self, callback: impl Fn(&TableEvent) + Send + Sync + 'static) -> Unsubscribe {
        self.inner.events.subscribe(callback)
    }

    /// Transient toast-style messages.
    pub fn on_notification(
        &self,
        callback: impl Fn(&Notification) + Send + Sync + 'static,
    ) -> Unsubscribe {
        self.inner.notifications.subscribe(callback)
    }

    // -----------------------------------------------------------------------
    // Subscription lifecycle
    // -----------------------------------------------------------------------

    /// Subscribe to the collection and return the pump that feeds snapshots
    /// into this table. Any earlier pump stops.
    pub fn attach(&self) -> Result<SnapshotPump> {
        let subscription = self.inner.dispatcher.subscribe()?;
        let mut generation = 0;
        self.inner.generation.send_modify(|g| {
            *g += 1;
            generation = *g;
        });
        self.inner.attached.store(true, Ordering::Release);
        info!(
            target: "live_table::table",
            collection = self.collection(),
            generation,
            "attached"
        );
        Ok(SnapshotPump::new(
            Arc::downgrade(&self.inner),
            subscription,
            self.inner.generation(),
            generation,
        ))
    }

    /// Stop the current pump. Deliveries it receives from now on are
    /// discarded and its subscription is released. Table state is kept.
    pub fn detach(&self) {
        if !self.inner.attached.swap(false, Ordering::AcqRel) {
            return;
        }
        self.inner.generation.send_modify(|g| *g += 1);
        info!(target: "live_table::table", collection = self.collection(), "detached");
    }

    pub fn is_attached(&self) -> bool {
        self.inner.attached.load(Ordering::Acquire)
    }

    /// Apply a snapshot directly, bypassing the channel.
    pub fn apply_snapshot(&self, snapshot: Collection) {
        self.inner.apply_snapshot(snapshot);
    }

    /// Record a snapshot stream failure directly. The current view is kept.
    pub fn apply_failure(&self, error: SubscriptionError) {
        self.inner.apply_failure(error);
    }

    // -----------------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------------

    pub fn search(&self, text: &str) {
        {
            let mut st = self.inner.state.lock();
            if st.query == text {
                return;
            }
            st.query = text.to_string();
        }
        self.inner.render();
    }

    /// Open an edit session on `key`.
    pub fn start_edit(&self, key: &Key) -> Result<()> {
        self.inner.ensure_not_busy("start_edit")?;
        {
            let mut st = self.inner.state.lock();
            let record = st
                .mirror
                .get(key)
                .cloned()
                .ok_or_else(|| EditError::RecordNotFound(key.clone()));
            let started = record.and_then(|record| st.session.start(key.clone(), &record));
            if let Err(err) = started {
                drop(st);
                return Err(self.inner.reject("start_edit", err.into()));
            }
        }
        debug!(target: "live_table::table", collection = self.collection(), key = %key, "edit started");
        self.inner.events.emit(&TableEvent::EditStarted {
            collection: self.collection().to_string(),
            key: key.clone(),
        });
        self.inner.render();
        Ok(())
    }

    /// Write one field of the working copy. Input is coerced; validation
    /// waits for save.
    pub fn set_field(&self, field: &str, value: impl Into<FieldValue>) -> Result<()> {
        let result = {
            let mut st = self.inner.state.lock();
            st.session.set_field(&self.inner.schema, field, value.into())
        };
        if let Err(err) = result {
            return Err(self.inner.reject("set_field", err.into()));
        }
        self.inner.render();
        Ok(())
    }

    /// Close the edit session without writing.
    pub fn cancel(&self) -> Result<()> {
        let result = self.inner.state.lock().session.cancel();
        let key = result.map_err(|err| self.inner.reject("cancel", err.into()))?;
        debug!(target: "live_table::table", collection = self.collection(), key = %key, "edit cancelled");
        self.inner.events.emit(&TableEvent::EditCancelled {
            collection: self.collection().to_string(),
            key,
        });
        self.inner.render();
        Ok(())
    }

    /// Write the working copy. The session closes once the store
    /// acknowledges; on failure it stays open with its edits intact.
    pub async fn save(&self) -> Result<()> {
        self.inner.ensure_not_busy("save")?;
        let begun = self.inner.state.lock().session.begin_save();
        let (key, working) = begun.map_err(|err| self.inner.reject("save", err.into()))?;
        let mut pending = PendingSave {
            inner: &self.inner,
            key: key.clone(),
            armed: true,
        };
        self.inner.render();

        let result = self.inner.dispatcher.save(&key, working).await;

        let committed = {
            let outcome = result.as_ref().map(|_| ()).map_err(|e| e.to_string());
            self.inner.state.lock().session.finish_save(&key, outcome)
        };
        pending.armed = false;
        drop(pending);
        if committed {
            self.inner.events.emit(&TableEvent::EditCommitted {
                collection: self.collection().to_string(),
                key,
            });
        }
        self.inner.render();
        result
    }

    /// Validate `draft` and store it as a new record.
    pub async fn create(&self, draft: Record) -> Result<Key> {
        self.inner.ensure_not_busy("create")?;
        let result = self.inner.dispatcher.create(draft).await;
        self.inner.render();
        result
    }

    /// Delete `key`. Requires `confirmed`; rejected while a record is being
    /// edited or a write is outstanding.
    pub async fn delete(&self, key: &Key, confirmed: bool) -> Result<()> {
        self.inner.ensure_not_busy("delete")?;
        {
            let st = self.inner.state.lock();
            if let Some(target) = st.session.target().cloned() {
                drop(st);
                return Err(self
                    .inner
                    .reject("delete", EditError::AlreadyEditing { target }.into()));
            }
            if st.mirror.get(key).is_none() {
                drop(st);
                return Err(self
                    .inner
                    .reject("delete", EditError::RecordNotFound(key.clone()).into()));
            }
        }
        if !confirmed {
            return self.inner.dispatcher.delete(key, false).await;
        }

        let mut hidden = None;
        let hide = match self.inner.delete_policy {
            DeletePolicy::Optimistic => self.inner.state.lock().mirror.hide(key),
            DeletePolicy::Pessimistic => false,
        };
        if hide {
            hidden = Some(HiddenRow {
                inner: &self.inner,
                key: key.clone(),
                armed: true,
            });
            self.inner.render();
        }

        let result = self.inner.dispatcher.delete(key, true).await;
        if let Some(row) = hidden.as_mut() {
            row.armed = result.is_err();
        }
        drop(hidden);
        self.inner.render();
        result
    }
}

impl std::fmt::Debug for LiveTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveTable")
            .field("collection", &self.collection())
            .field("attached", &self.is_attached())
            .field("busy", &self.is_busy())
            .finish()
    }
}
