use std::fmt;
use thiserror::Error;

use crate::types::Key;

// ---------------------------------------------------------------------------
// ValidationError / ValidationErrors
// ---------------------------------------------------------------------------

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub expected: String,
    pub received: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"Invalid field "{}": expected {}, received {}"#,
            self.field, self.expected, self.received
        )
    }
}

impl std::error::Error for ValidationError {}

/// One or more `ValidationError`s collected from a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    /// Names of the offending fields, in the order they were reported.
    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.field.as_str()).collect()
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed:")?;
        for e in &self.0 {
            write!(f, "\n  - {}: expected {}, received {}", e.field, e.expected, e.received)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// ---------------------------------------------------------------------------
// ChannelError
// ---------------------------------------------------------------------------

/// Failure reported by a `RemoteCollectionChannel`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Record not found: {collection}/{key}")]
    NotFound { collection: String, key: Key },

    #[error("Channel closed")]
    Closed,
}

// ---------------------------------------------------------------------------
// SubscriptionError
// ---------------------------------------------------------------------------

/// The snapshot stream for a collection failed or delivered garbage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Subscription to \"{collection}\" failed: {source}")]
    Channel {
        collection: String,
        #[source]
        source: ChannelError,
    },

    #[error("Malformed snapshot for \"{collection}\": {reason}")]
    Malformed { collection: String, reason: String },
}

// ---------------------------------------------------------------------------
// WriteError
// ---------------------------------------------------------------------------

/// The kind of write a dispatcher operation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// A create/update/delete was attempted and the channel rejected it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to {operation} in \"{collection}\"{}: {source}", key_suffix(.key))]
pub struct WriteError {
    pub operation: OperationKind,
    pub collection: String,
    pub key: Option<Key>,
    #[source]
    pub source: ChannelError,
}

fn key_suffix(key: &Option<Key>) -> String {
    match key {
        Some(k) => format!(" (record {k})"),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// EditError
// ---------------------------------------------------------------------------

/// An edit-session intent was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("Record {target} is already being edited")]
    AlreadyEditing { target: Key },

    #[error("No record is being edited")]
    NotEditing,

    #[error("Unknown field \"{0}\"")]
    UnknownField(String),

    #[error("Nothing to save: no field has changed")]
    NotDirty,

    #[error("Record {0} is not in the current view")]
    RecordNotFound(Key),

    #[error("A save for record {target} is already in flight")]
    SaveInFlight { target: Key },
}

// ---------------------------------------------------------------------------
// LiveTableError: top-level rollup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LiveTableError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("Another write is already outstanding for \"{collection}\"")]
    Busy { collection: String },

    #[error("Deleting record {key} requires confirmation")]
    ConfirmationRequired { key: Key },
}

/// Convenience alias: the default error type is `LiveTableError`.
pub type Result<T, E = LiveTableError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
