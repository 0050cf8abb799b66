//! Single-consumer result collection.
//!
//! All workers feed one mpsc channel; the collector task drains it, hands
//! each qualifying handle to the run's `MatchHandler` in arrival order, and
//! owns the result counter exclusively until the channel closes.

use crate::runtime::telemetry::Telemetry;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Receives each qualifying handle as it is found, in arrival order.
///
/// Called only from the collector task, so implementations never see
/// concurrent invocations.
pub trait MatchHandler: Send + 'static {
    fn on_match(&mut self, handle: &str);
}

/// Prints each qualifying handle to stdout as it arrives.
#[derive(Debug, Default)]
pub struct PrintHandler;

impl MatchHandler for PrintHandler {
    fn on_match(&mut self, handle: &str) {
        println!("{handle}");
    }
}

/// Counter owned exclusively by the collector while the run is active and
/// read by the orchestrator only after the channel has drained.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub matched: u64,
}

pub(crate) fn spawn_collector<H: MatchHandler>(
    mut results_rx: mpsc::Receiver<String>,
    handler: Arc<Mutex<H>>,
    telemetry: Arc<Telemetry>,
) -> JoinHandle<RunStats> {
    tokio::spawn(async move {
        let mut stats = RunStats::default();

        while let Some(handle) = results_rx.recv().await {
            {
                let mut handler = handler.lock().await;
                handler.on_match(&handle);
            }
            stats.matched += 1;
            telemetry.record_match();
        }

        tracing::debug!(matched = stats.matched, "collector drained result channel");
        stats
    })
}
