//! Tests for search filtering.

use live_table::entities;
use live_table::query::{matches_query, query_view};
use live_table::types::{Collection, Key, Record};

fn batch(id: &str, product: &str, status: &str) -> Record {
    Record::new()
        .with("batchId", id)
        .with("product", product)
        .with("startDate", "2024-01-01")
        .with("completion", 0)
        .with("status", status)
}

fn sample() -> Collection {
    [
        ("k3", batch("B-789", "Night Cream", "In Progress")),
        ("k1", batch("B-100", "Serum", "Completed")),
        ("k2", batch("B-701", "Toner", "QA Pending")),
        ("k4", batch("C-200", "Cleanser", "On Hold")),
    ]
    .into_iter()
    .map(|(k, r)| (Key::new(k), r))
    .collect()
}

fn ids(rows: &[live_table::types::Row]) -> Vec<String> {
    rows.iter()
        .map(|r| r.record.get("batchId").unwrap().display())
        .collect()
}

#[test]
fn empty_query_returns_everything_in_order() {
    let rows = query_view(&sample(), &entities::batches(), "");
    assert_eq!(ids(&rows), vec!["B-100", "B-701", "B-789", "C-200"]);
}

#[test]
fn match_is_case_insensitive_substring() {
    let schema = entities::batches();
    assert_eq!(ids(&query_view(&sample(), &schema, "b-7")), vec!["B-701", "B-789"]);
    assert_eq!(ids(&query_view(&sample(), &schema, "CREAM")), vec!["B-789"]);
    assert_eq!(ids(&query_view(&sample(), &schema, "pending")), vec!["B-701"]);
}

#[test]
fn only_searchable_fields_participate() {
    // startDate is not searchable.
    assert!(query_view(&sample(), &entities::batches(), "2024").is_empty());
}

#[test]
fn no_match_returns_empty() {
    assert!(query_view(&sample(), &entities::batches(), "zzz").is_empty());
}

#[test]
fn every_query_is_a_subset_of_the_full_view() {
    let schema = entities::batches();
    let full = query_view(&sample(), &schema, "");
    for q in ["b", "B-7", "serum", "o", "In", " ", "x"] {
        let subset = query_view(&sample(), &schema, q);
        assert!(subset.iter().all(|row| full.contains(row)), "query {q:?}");
        // Same relative order as the full view.
        let positions: Vec<usize> = subset
            .iter()
            .map(|row| full.iter().position(|f| f == row).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "query {q:?}");
    }
}

#[test]
fn repeated_queries_are_identical() {
    let schema = entities::batches();
    assert_eq!(
        query_view(&sample(), &schema, "b-7"),
        query_view(&sample(), &schema, "b-7")
    );
}

#[test]
fn numbers_match_on_their_display_form() {
    let schema = live_table::schema::entity("parts")
        .field("code", live_table::schema::t::number().searchable())
        .build();
    let record = Record::new().with("code", 4021);
    assert!(matches_query(&record, &schema, "402"));
    assert!(!matches_query(&record, &schema, "4021.0"));
}
