// Path: crates/agent/src/watcher.rs
//! Turns main-chain progress into chain-update signals.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{self, MissedTickBehavior};
use witness_api::LedgerQuery;
use witness_types::app::MainChainIndex;

/// Creates the signal channel between a [`ChainWatcher`] and the controller.
///
/// Capacity is one: a burst of updates collapses into a single pending signal.
pub fn signal_channel() -> (mpsc::Sender<()>, mpsc::Receiver<()>) {
    mpsc::channel(1)
}

/// Polls the ledger and signals whenever the global main-chain index advances.
pub struct ChainWatcher {
    ledger: Arc<dyn LedgerQuery>,
    poll_interval: Duration,
}

impl ChainWatcher {
    pub fn new(ledger: Arc<dyn LedgerQuery>, poll_interval: Duration) -> Self {
        Self {
            ledger,
            poll_interval,
        }
    }

    /// Polls until the receiving side of `signals` is dropped.
    pub async fn run(self, signals: mpsc::Sender<()>) {
        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_seen: Option<MainChainIndex> = None;

        loop {
            ticker.tick().await;
            let position = match self.ledger.global_chain_position().await {
                Ok(Some(position)) => position,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(target: "watcher", error = %e, "Failed to poll main chain");
                    continue;
                }
            };
            if last_seen.is_some_and(|seen| position <= seen) {
                continue;
            }
            last_seen = Some(position);
            tracing::debug!(target: "watcher", mci = position, "main chain advanced");
            match signals.try_send(()) {
                Ok(()) | Err(TrySendError::Full(())) => {}
                Err(TrySendError::Closed(())) => {
                    tracing::info!(target: "watcher", "Signal receiver dropped, stopping");
                    return;
                }
            }
        }
    }
}
