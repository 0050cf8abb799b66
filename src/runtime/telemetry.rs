use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Default interval used by the metrics reporter task.
pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(5);

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a basic tracing subscriber (if one is not already active).
///
/// The subscriber honours `RUST_LOG` if it is present, otherwise it falls back to `info`.
/// Calling this function multiple times is harmless.
pub fn init_tracing() {
    if TRACING_INIT.get().is_some() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();

    let _ = TRACING_INIT.set(());
}

/// Lightweight rolling counters used to derive runtime metrics.
#[derive(Default, Debug)]
pub struct Telemetry {
    handles_probed: AtomicU64,
    matches_found: AtomicU64,
    probe_errors: AtomicU64,
    probe_timeouts: AtomicU64,
    worker_pool_transitions: AtomicU64,
    worker_pool_size: AtomicUsize,
}

impl Telemetry {
    pub fn record_probed(&self) {
        self.handles_probed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_match(&self) {
        self.matches_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_probe_error(&self) {
        self.probe_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_probe_timeout(&self) {
        self.probe_timeouts.fetch_add(1, Ordering::Relaxed);
        self.probe_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_worker_pool_size(&self, workers: usize) {
        self.worker_pool_size.store(workers, Ordering::Relaxed);
        self.worker_pool_transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            handles_probed: self.handles_probed.load(Ordering::Relaxed),
            matches_found: self.matches_found.load(Ordering::Relaxed),
            probe_errors: self.probe_errors.load(Ordering::Relaxed),
            probe_timeouts: self.probe_timeouts.load(Ordering::Relaxed),
        }
    }

    pub fn handles_probed(&self) -> u64 {
        self.handles_probed.load(Ordering::Relaxed)
    }

    pub fn matches_found(&self) -> u64 {
        self.matches_found.load(Ordering::Relaxed)
    }

    pub fn probe_errors(&self) -> u64 {
        self.probe_errors.load(Ordering::Relaxed)
    }

    pub fn probe_timeouts(&self) -> u64 {
        self.probe_timeouts.load(Ordering::Relaxed)
    }

    pub fn worker_pool_size(&self) -> usize {
        self.worker_pool_size.load(Ordering::Relaxed)
    }

    pub fn worker_pool_transitions(&self) -> u64 {
        self.worker_pool_transitions.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TelemetrySnapshot {
    pub handles_probed: u64,
    pub matches_found: u64,
    pub probe_errors: u64,
    pub probe_timeouts: u64,
}

/// Spawns a background task that periodically logs probe throughput, matches,
/// and error counts until the shutdown token is cancelled.
pub fn spawn_metrics_reporter(
    telemetry: Arc<Telemetry>,
    shutdown: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_snapshot = telemetry.snapshot();
        let mut last_tick = Instant::now();

        loop {
            select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(target: "handlecheck::metrics", "metrics reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let current_snapshot = telemetry.snapshot();
                    let probed_delta = current_snapshot
                        .handles_probed
                        .saturating_sub(last_snapshot.handles_probed);
                    let elapsed = last_tick.elapsed().as_secs_f64();
                    let throughput = if elapsed <= f64::EPSILON {
                        0.0
                    } else {
                        probed_delta as f64 / elapsed
                    };

                    tracing::info!(
                        target: "handlecheck::metrics",
                        throughput = format!("{throughput:.2}"),
                        probed = current_snapshot.handles_probed,
                        matched = current_snapshot.matches_found,
                        probe_errors = current_snapshot.probe_errors,
                        probe_timeouts = current_snapshot.probe_timeouts,
                        "runtime metrics snapshot"
                    );

                    last_snapshot = current_snapshot;
                    last_tick = Instant::now();
                }
            }
        }
    })
}
