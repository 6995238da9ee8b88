//! TableRegistry: one channel, one table per collection.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::{channel::RemoteCollectionChannel, error::Result, schema::EntitySchema};

use super::{live_table::LiveTable, options::LiveTableOptions, pump::SnapshotPump};

pub struct TableRegistry {
    channel: Arc<dyn RemoteCollectionChannel>,
    options: LiveTableOptions,
    tables: Mutex<BTreeMap<String, LiveTable>>,
}

impl TableRegistry {
    pub fn new(channel: Arc<dyn RemoteCollectionChannel>, options: LiveTableOptions) -> Self {
        Self {
            channel,
            options,
            tables: Mutex::new(BTreeMap::new()),
        }
    }

    /// Create the table for `schema` with the registry's options. A table
    /// already registered under the same collection name is detached and
    /// replaced.
    pub fn register(&self, schema: impl Into<Arc<EntitySchema>>) -> LiveTable {
        self.register_with(schema, self.options.clone())
    }

    /// [`register`](Self::register) with per-table options.
    pub fn register_with(
        &self,
        schema: impl Into<Arc<EntitySchema>>,
        options: LiveTableOptions,
    ) -> LiveTable {
        let schema = schema.into();
        let table = LiveTable::new(Arc::clone(&schema), Arc::clone(&self.channel), options);
        let replaced = self
            .tables
            .lock()
            .insert(schema.name.clone(), table.clone());
        if let Some(old) = replaced {
            debug!(target: "live_table::table", collection = %schema.name, "table replaced");
            old.detach();
        }
        table
    }

    pub fn get(&self, collection: &str) -> Option<LiveTable> {
        self.tables.lock().get(collection).cloned()
    }

    /// Registered collection names, sorted.
    pub fn collections(&self) -> Vec<String> {
        self.tables.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tables.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.lock().is_empty()
    }

    /// Attach every table, returning one pump per table in collection order.
    /// Stops at the first subscription failure; tables attached before it
    /// stay attached.
    pub fn attach_all(&self) -> Result<Vec<SnapshotPump>> {
        let tables: Vec<LiveTable> = self.tables.lock().values().cloned().collect();
        tables.iter().map(LiveTable::attach).collect()
    }

    pub fn detach_all(&self) {
        let tables: Vec<LiveTable> = self.tables.lock().values().cloned().collect();
        for table in tables {
            table.detach();
        }
    }
}
