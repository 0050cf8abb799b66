//! Probe worker. Each worker owns one contiguous slice of the handle list,
//! checks every handle in order, forwards the available ones to the
//! collector, and paces itself after each forwarded handle.

use crate::input::NameList;
use crate::probe::client::{AvailabilityProbe, ProbeError, ProbeVerdict};
use crate::runtime::telemetry::Telemetry;
use crate::scan::plan::Range;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

pub(crate) struct Worker {
    pub(crate) id: usize,
    pub(crate) names: NameList,
    pub(crate) range: Range,
    pub(crate) probe: Arc<dyn AvailabilityProbe>,
    pub(crate) results_tx: mpsc::Sender<String>,
    pub(crate) pace_delay: Duration,
    pub(crate) shutdown: CancellationToken,
    pub(crate) telemetry: Arc<Telemetry>,
}

impl Worker {
    #[tracing::instrument(name = "worker", skip_all, fields(worker = self.id))]
    pub(crate) async fn run(self) {
        tracing::debug!(
            worker = self.id,
            start = self.range.start,
            end = self.range.end,
            "worker task started"
        );

        for handle in self.names.slice(self.range) {
            if self.shutdown.is_cancelled() {
                tracing::info!(worker = self.id, "shutdown requested; exiting worker loop");
                break;
            }

            self.telemetry.record_probed();

            match self.probe.check(handle).await {
                Ok(ProbeVerdict::Available) => {
                    if self.results_tx.send(handle.clone()).await.is_err() {
                        // The collector is gone; nothing left to report to.
                        tracing::warn!(
                            worker = self.id,
                            "result channel closed before worker finished"
                        );
                        break;
                    }
                    if !self.pace_delay.is_zero() {
                        sleep(self.pace_delay).await;
                    }
                }
                Ok(ProbeVerdict::Taken) => {}
                Ok(ProbeVerdict::Indeterminate) => {
                    self.telemetry.record_probe_error();
                    tracing::debug!(
                        worker = self.id,
                        handle = %handle,
                        "probe could not determine availability; treating handle as taken"
                    );
                }
                Err(err) => {
                    if matches!(err.downcast_ref::<ProbeError>(), Some(ProbeError::Timeout { .. })) {
                        self.telemetry.record_probe_timeout();
                    } else {
                        self.telemetry.record_probe_error();
                    }
                    tracing::debug!(
                        worker = self.id,
                        handle = %handle,
                        error = %err,
                        "probe failed; treating handle as taken"
                    );
                }
            }
        }

        tracing::debug!(worker = self.id, "worker task exited");
    }
}
