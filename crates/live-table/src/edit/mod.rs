//! Local state core: the collection mirror and the exclusive edit session.
//!
//! - [`mirror`]: [`CollectionMirror`], snapshot application and display order.
//! - [`session`]: [`EditSession`], the `Idle`/`Editing` state machine.

pub mod mirror;
pub mod session;

pub use mirror::{ordered_rows, CollectionMirror, SnapshotOutcome};
pub use session::{ActiveEdit, EditSession, EditState, RebaseOutcome};
