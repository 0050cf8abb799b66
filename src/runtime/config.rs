use crate::runtime::telemetry;
use anyhow::{bail, Context, Result};
use std::time::Duration;

/// Default worker count when the caller does not ask for more.
pub const DEFAULT_WORKER_COUNT: usize = 2;
const DEFAULT_PACE_DELAY_MS: u64 = 100;
const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Runtime configuration for the availability scan pipeline.
///
/// All instances must be constructed via [`CheckerConfig::builder`] or
/// [`CheckerConfig::new`] so invariants are validated before any consumer
/// observes the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerConfig {
    endpoint_url: String,
    session_url: Option<String>,
    worker_count: usize,
    pace_delay: Duration,
    probe_timeout: Duration,
    metrics_interval: Duration,
}

pub struct CheckerConfigParams {
    pub endpoint_url: String,
    pub session_url: Option<String>,
    pub worker_count: usize,
    pub pace_delay: Duration,
    pub probe_timeout: Duration,
    pub metrics_interval: Duration,
}

impl CheckerConfig {
    /// Returns a builder to incrementally construct and validate a
    /// configuration.
    pub fn builder() -> CheckerConfigBuilder {
        CheckerConfigBuilder::default()
    }

    /// Constructs a configuration directly from the provided values.
    ///
    /// Prefer [`CheckerConfig::builder`] when many values use defaults.
    pub fn new(params: CheckerConfigParams) -> Result<Self> {
        let CheckerConfigParams {
            endpoint_url,
            session_url,
            worker_count,
            pace_delay,
            probe_timeout,
            metrics_interval,
        } = params;

        let config = Self {
            endpoint_url: trimmed_string(endpoint_url),
            session_url: session_url.map(trimmed_string),
            worker_count,
            pace_delay,
            probe_timeout,
            metrics_interval,
        };

        config.validate()?;
        Ok(config)
    }

    /// Signup-check endpoint the probe posts to.
    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    /// Session page used to bootstrap the anti-CSRF token, if any.
    pub fn session_url(&self) -> Option<&str> {
        self.session_url.as_deref()
    }

    /// Requested worker count. The scan resolves the effective count per run
    /// so there are never more workers than handles.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Pause observed by a worker after each forwarded handle. May be zero.
    pub fn pace_delay(&self) -> Duration {
        self.pace_delay
    }

    /// Per-call ceiling applied to every probe request.
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Interval used by the telemetry reporter.
    pub fn metrics_interval(&self) -> Duration {
        self.metrics_interval
    }

    /// Performs validation on an existing configuration instance.
    pub fn validate(&self) -> Result<()> {
        validate_url(&self.endpoint_url, "endpoint_url")?;
        if let Some(session_url) = &self.session_url {
            validate_url(session_url, "session_url")?;
        }

        if self.worker_count == 0 {
            bail!("worker_count must be greater than 0");
        }

        if self.probe_timeout.is_zero() {
            bail!("probe_timeout must be greater than 0");
        }

        if self.metrics_interval.is_zero() {
            bail!("metrics_interval must be greater than 0");
        }

        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct CheckerConfigBuilder {
    endpoint_url: Option<String>,
    session_url: Option<String>,
    worker_count: Option<usize>,
    pace_delay: Option<Duration>,
    probe_timeout: Option<Duration>,
    metrics_interval: Option<Duration>,
}

impl CheckerConfigBuilder {
    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    pub fn session_url(mut self, url: impl Into<String>) -> Self {
        self.session_url = Some(url.into());
        self
    }

    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = Some(count);
        self
    }

    pub fn pace_delay(mut self, delay: Duration) -> Self {
        self.pace_delay = Some(delay);
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    pub fn metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = Some(interval);
        self
    }

    pub fn build(self) -> Result<CheckerConfig> {
        let params = CheckerConfigParams {
            endpoint_url: self.endpoint_url.context("endpoint_url is required")?,
            session_url: self.session_url,
            worker_count: self.worker_count.unwrap_or(DEFAULT_WORKER_COUNT),
            pace_delay: self
                .pace_delay
                .unwrap_or_else(|| Duration::from_millis(DEFAULT_PACE_DELAY_MS)),
            probe_timeout: self
                .probe_timeout
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS)),
            metrics_interval: self
                .metrics_interval
                .unwrap_or(telemetry::DEFAULT_METRICS_INTERVAL),
        };

        CheckerConfig::new(params)
    }
}

fn trimmed_string(value: String) -> String {
    value.trim().to_owned()
}

fn validate_url(url: &str, field: &str) -> Result<()> {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("{field} must start with http:// or https://");
    }
    Ok(())
}
