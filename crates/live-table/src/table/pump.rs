//! SnapshotPump: moves deliveries from a subscription into a table.

use std::sync::{Arc, Weak};

use tokio::sync::watch;
use tracing::debug;

use crate::channel::Subscription;

use super::live_table::TableInner;

/// What one [`SnapshotPump::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpStep {
    /// A snapshot replaced the table's view.
    Applied,
    /// The stream reported a failure; the view was kept.
    Failed,
    /// The channel ended the stream.
    Closed,
    /// The table was detached, re-attached or dropped. Nothing was applied
    /// and the subscription has been released.
    Detached,
}

impl PumpStep {
    /// Whether the pump can make further progress.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Applied | Self::Failed)
    }
}

/// Feeds one subscription into one table for one attach generation.
///
/// Holds the table weakly: a pump never keeps a torn-down table alive, and a
/// delivery that arrives after teardown is dropped instead of applied.
#[derive(Debug)]
pub struct SnapshotPump {
    table: Weak<TableInner>,
    subscription: Subscription,
    generation_rx: watch::Receiver<u64>,
    generation: u64,
}

impl SnapshotPump {
    pub(crate) fn new(
        table: Weak<TableInner>,
        subscription: Subscription,
        generation_rx: watch::Receiver<u64>,
        generation: u64,
    ) -> Self {
        Self {
            table,
            subscription,
            generation_rx,
            generation,
        }
    }

    pub fn collection(&self) -> &str {
        self.subscription.collection()
    }

    /// Wait for and apply exactly one delivery.
    pub async fn step(&mut self) -> PumpStep {
        if self.current().is_none() {
            return self.release();
        }

        let generation = self.generation;
        let delivery = tokio::select! {
            biased;
            _ = superseded(&mut self.generation_rx, generation) => None,
            delivery = self.subscription.next() => Some(delivery),
        };

        let Some(delivery) = delivery else {
            return self.release();
        };
        let Some(delivery) = delivery else {
            debug!(
                target: "live_table::table",
                collection = self.collection(),
                "snapshot stream closed"
            );
            return PumpStep::Closed;
        };

        // Re-check: the table may have been torn down while we waited.
        let Some(table) = self.current() else {
            return self.release();
        };
        match delivery {
            Ok(snapshot) => {
                table.apply_snapshot(snapshot);
                PumpStep::Applied
            }
            Err(error) => {
                table.apply_failure(error);
                PumpStep::Failed
            }
        }
    }

    /// Apply deliveries until the stream closes or the table detaches.
    pub async fn run(mut self) -> PumpStep {
        loop {
            let step = self.step().await;
            if !step.is_live() {
                return step;
            }
        }
    }

    /// [`run`](Self::run) on the current tokio runtime.
    pub fn spawn(self) -> tokio::task::JoinHandle<PumpStep> {
        tokio::spawn(self.run())
    }

    /// The table, if it still exists and this pump's generation is current.
    fn current(&self) -> Option<Arc<TableInner>> {
        if *self.generation_rx.borrow() != self.generation {
            return None;
        }
        self.table.upgrade()
    }

    fn release(&mut self) -> PumpStep {
        if self.subscription.is_active() {
            debug!(
                target: "live_table::table",
                collection = self.collection(),
                generation = self.generation,
                "pump detached; releasing subscription"
            );
        }
        self.subscription.unsubscribe();
        PumpStep::Detached
    }
}

/// Resolves once the attach generation moves past `generation` or the table
/// is dropped.
async fn superseded(rx: &mut watch::Receiver<u64>, generation: u64) {
    let _ = rx.wait_for(|g| *g != generation).await.map(|_| ());
}
