//! The live table engine and its UI projection.
//!
//! # Modules
//!
//! - [`live_table`]: [`LiveTable`], one per collection: intents, rendering,
//!   snapshot application.
//! - [`pump`]: [`SnapshotPump`], the subscription-to-table bridge.
//! - [`options`]: [`LiveTableOptions`] and [`DeletePolicy`].
//! - [`view`]: [`TableView`], the render payload.
//! - [`registry`]: [`TableRegistry`], many tables over one channel.

pub mod live_table;
pub mod options;
pub mod pump;
pub mod registry;
pub mod view;

pub use live_table::LiveTable;
pub use options::{DeletePolicy, LiveTableOptions};
pub use pump::{PumpStep, SnapshotPump};
pub use registry::TableRegistry;
pub use view::TableView;
