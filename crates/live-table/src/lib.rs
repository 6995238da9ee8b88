pub mod error;
pub mod types;

pub mod channel;
pub mod dispatch;
pub mod edit;
pub mod entities;
pub mod query;
pub mod reactive;
pub mod schema;
pub mod table;
