use crate::input::NameList;
use crate::runtime::telemetry::spawn_metrics_reporter;
use crate::scan::checker::{HandleChecker, ScanReport};
use crate::scan::collector::MatchHandler;
use anyhow::Result;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Coordinates a scan's lifecycle and handles OS signals for graceful
/// shutdowns.
pub struct Runner<H: MatchHandler> {
    checker: HandleChecker<H>,
    shutdown: CancellationToken,
}

impl<H: MatchHandler> Runner<H> {
    /// Creates a new runner and wires a root [`CancellationToken`] that
    /// propagates through the worker pool.
    pub fn new(mut checker: HandleChecker<H>) -> Self {
        let shutdown = CancellationToken::new();
        checker.replace_shutdown_root(shutdown.clone());
        Self { checker, shutdown }
    }

    /// Returns a clone of the root shutdown token so external callers can
    /// integrate with their own signal handlers or cancellation strategies.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn checker(&self) -> &HandleChecker<H> {
        &self.checker
    }

    /// Runs the scan to completion, cancelling the worker pool if Ctrl-C
    /// (SIGINT) arrives first. A cancelled scan still joins every task and
    /// reports the results collected so far.
    pub async fn run_until_ctrl_c(&self, names: &NameList) -> Result<ScanReport> {
        let shutdown = self.shutdown.clone();
        let signal_task = tokio::spawn(async move {
            tokio::select! {
                result = signal::ctrl_c() => {
                    if result.is_ok() {
                        tracing::info!("Ctrl-C received; cancelling scan");
                        shutdown.cancel();
                    }
                }
                _ = shutdown.cancelled() => {}
            }
        });

        let reporter = spawn_metrics_reporter(
            self.checker.telemetry(),
            self.shutdown.child_token(),
            self.checker.config().metrics_interval(),
        );

        let report = self.checker.run(names).await;

        signal_task.abort();
        reporter.abort();

        report
    }
}
