//! Query view: search filtering and summary counts over the mirror.

pub mod execute;
pub mod summary;

pub use execute::{filter_rows, matches_query, query_view};
pub use summary::{summarize, Summary};
