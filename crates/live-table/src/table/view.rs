//! The UI projection: everything a renderer needs, in one value.

use crate::{
    dispatch::PendingOperation,
    edit::{ActiveEdit, EditState},
    query::Summary,
    types::{Key, Row},
};

#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub collection: String,
    /// Rows matching `query`, in display order.
    pub rows: Vec<Row>,
    /// Visible rows before filtering.
    pub total: usize,
    pub query: String,
    pub edit: EditState,
    /// A write for this collection is outstanding.
    pub busy: bool,
    pub pending: Option<PendingOperation>,
    /// Last snapshot stream failure, cleared by the next good snapshot.
    pub error: Option<String>,
    /// At least one snapshot has been applied.
    pub loaded: bool,
    pub summary: Summary,
}

impl TableView {
    pub fn active_edit(&self) -> Option<&ActiveEdit> {
        match &self.edit {
            EditState::Idle => None,
            EditState::Editing(edit) => Some(edit),
        }
    }

    pub fn is_editing(&self, key: &Key) -> bool {
        self.active_edit().is_some_and(|e| &e.target == key)
    }

    /// Whether per-row Edit/Delete actions are available. They are disabled
    /// on every row while a record is being edited or a write is outstanding.
    pub fn row_actions_enabled(&self) -> bool {
        !self.busy && self.active_edit().is_none()
    }

    /// Whether the save action is available for the active edit.
    pub fn can_save(&self) -> bool {
        self.active_edit()
            .is_some_and(|e| e.is_dirty() && !e.saving && !self.busy)
    }

    pub fn row(&self, key: &Key) -> Option<&Row> {
        self.rows.iter().find(|r| &r.key == key)
    }

    /// The "no records found" state: loaded, but nothing matches.
    pub fn is_empty(&self) -> bool {
        self.loaded && self.rows.is_empty()
    }
}
