//! Write dispatch: validated create/update/delete against the channel under a
//! per-collection busy flag.

pub mod dispatcher;
pub mod types;

pub use dispatcher::CommandDispatcher;
pub use types::{ErrorCallback, OperationOutcome, PendingOperation};
