//! Scan orchestration.
//!
//! `HandleChecker` owns one run of the pipeline: it resolves the work plan,
//! spawns the collector and one worker task per range, joins every worker,
//! closes the result channel exactly once, waits for the collector to drain,
//! and reports the final count with elapsed wall time.

use crate::input::NameList;
use crate::probe::client::{AvailabilityProbe, HttpProbe};
use crate::runtime::config::CheckerConfig;
use crate::runtime::telemetry::Telemetry;
use crate::scan::collector::{spawn_collector, MatchHandler, RunStats};
use crate::scan::plan::WorkPlan;
use crate::scan::worker::Worker;
use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Final report handed back to the caller once every worker has joined and
/// the collector has drained.
#[derive(Debug, Clone, Copy)]
pub struct ScanReport {
    pub matched: u64,
    pub elapsed: Duration,
}

pub struct HandleChecker<H: MatchHandler> {
    config: CheckerConfig,
    probe: Arc<dyn AvailabilityProbe>,
    handler: Arc<Mutex<H>>,
    telemetry: Arc<Telemetry>,
    shutdown_root: CancellationToken,
}

impl<H: MatchHandler> HandleChecker<H> {
    /// Builds a checker backed by the HTTP probe, bootstrapping the signup
    /// session when one is configured.
    pub async fn connect(config: CheckerConfig, handler: H) -> Result<Self> {
        let probe = HttpProbe::connect(&config).await?;
        Ok(Self::with_probe(config, Arc::new(probe), handler))
    }

    /// Builds a checker with a caller-supplied probe. This is the seam tests
    /// and embedders use to run the pipeline without a network.
    pub fn with_probe(
        config: CheckerConfig,
        probe: Arc<dyn AvailabilityProbe>,
        handler: H,
    ) -> Self {
        Self {
            config,
            probe,
            handler: Arc::new(Mutex::new(handler)),
            telemetry: Arc::new(Telemetry::default()),
            shutdown_root: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Handle to the run's match handler, for inspection after a run.
    pub fn handler(&self) -> Arc<Mutex<H>> {
        self.handler.clone()
    }

    pub fn telemetry(&self) -> Arc<Telemetry> {
        self.telemetry.clone()
    }

    /// Replaces the root shutdown token so external callers can integrate
    /// their own cancellation strategies.
    pub fn replace_shutdown_root(&mut self, shutdown: CancellationToken) {
        self.shutdown_root = shutdown;
    }

    /// Runs the full scan over `names` and reports the final count.
    ///
    /// Cancellation makes workers stop probing early, but the shutdown
    /// ordering is always the same: join every worker, then close the result
    /// channel, then drain the collector. No emitted result is lost or
    /// double-counted, and the run never hangs on a single bad probe.
    pub async fn run(&self, names: &NameList) -> Result<ScanReport> {
        let started = Instant::now();
        let plan = WorkPlan::build(names.len(), self.config.worker_count());
        self.telemetry
            .record_worker_pool_size(plan.effective_workers());

        tracing::info!(
            handles = names.len(),
            requested_workers = self.config.worker_count(),
            effective_workers = plan.effective_workers(),
            "starting availability scan"
        );

        let capacity = plan.effective_workers().saturating_mul(4).max(8);
        let (results_tx, results_rx) = mpsc::channel::<String>(capacity);

        let collector = spawn_collector(results_rx, self.handler.clone(), self.telemetry.clone());

        let run_token = self.shutdown_root.child_token();
        let mut workers = Vec::with_capacity(plan.ranges().len());
        for (worker_id, range) in plan.ranges().iter().copied().enumerate() {
            let worker = Worker {
                id: worker_id,
                names: names.clone(),
                range,
                probe: self.probe.clone(),
                results_tx: results_tx.clone(),
                pace_delay: self.config.pace_delay(),
                shutdown: run_token.clone(),
                telemetry: self.telemetry.clone(),
            };
            workers.push(tokio::spawn(worker.run()));
        }

        let results = join_all(workers).await;
        for (worker_id, result) in results.into_iter().enumerate() {
            if let Err(err) = result {
                tracing::warn!(worker = worker_id, error = %err, "worker task terminated unexpectedly");
            }
        }

        // Every worker clone is gone once the joins complete, so dropping the
        // original sender is the single close of the result stream.
        drop(results_tx);

        let stats: RunStats = collector
            .await
            .context("failed to join collector task")?;

        let elapsed = started.elapsed();
        tracing::info!(
            matched = stats.matched,
            elapsed_secs = format!("{:.3}", elapsed.as_secs_f64()),
            "availability scan complete"
        );

        Ok(ScanReport {
            matched: stats.matched,
            elapsed,
        })
    }
}
