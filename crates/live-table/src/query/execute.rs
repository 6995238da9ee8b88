//! Search-box filtering over an ordered view.
//!
//! A pure function of (collection, query): no state, no side effects, cheap
//! enough to rerun on every keystroke and every snapshot.

use crate::{
    edit::ordered_rows,
    schema::EntitySchema,
    types::{Collection, Record, Row},
};

/// Rows of `collection`, in display order, whose searchable fields contain
/// `query` case-insensitively. An empty query keeps every row.
pub fn query_view(collection: &Collection, schema: &EntitySchema, query: &str) -> Vec<Row> {
    let rows = ordered_rows(collection, schema.order_by.as_deref());
    filter_rows(rows, schema, query)
}

/// Filter already-ordered rows, preserving their order.
pub fn filter_rows(rows: Vec<Row>, schema: &EntitySchema, query: &str) -> Vec<Row> {
    if query.is_empty() {
        return rows;
    }
    let needle = query.to_lowercase();
    rows.into_iter()
        .filter(|row| matches_query(&row.record, schema, &needle))
        .collect()
}

/// Whether any searchable field of `record` contains `needle`.
///
/// `needle` must already be lowercased.
pub fn matches_query(record: &Record, schema: &EntitySchema, needle: &str) -> bool {
    schema.searchable_fields().any(|field| {
        record
            .get(field)
            .map(|value| value.display().to_lowercase().contains(needle))
            .unwrap_or(false)
    })
}
