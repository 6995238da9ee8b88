//! Footer statistics: how many rows are shown, out of how many, and how the
//! whole collection splits across status values.

use std::collections::BTreeMap;

use crate::{
    schema::{EntitySchema, FieldKind},
    types::Collection,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Rows matching the current query.
    pub shown: usize,
    /// Rows in the collection.
    pub total: usize,
    /// Count per status value over the whole collection. Every declared
    /// option is present, zero or not; undeclared values get their own entry.
    pub by_status: BTreeMap<String, usize>,
}

impl Summary {
    pub fn status_count(&self, status: &str) -> usize {
        self.by_status.get(status).copied().unwrap_or(0)
    }
}

pub fn summarize(collection: &Collection, schema: &EntitySchema, shown: usize) -> Summary {
    let mut by_status = BTreeMap::new();
    if let Some((field, def)) = schema.status_field() {
        if let FieldKind::Status { options, .. } = &def.kind {
            for option in options {
                by_status.insert(option.clone(), 0);
            }
        }
        for record in collection.values() {
            if let Some(value) = record.get(field) {
                *by_status.entry(value.display()).or_insert(0) += 1;
            }
        }
    }
    Summary {
        shown,
        total: collection.len(),
        by_status,
    }
}
