//! HTTP availability probe. Houses the `AvailabilityProbe` trait consumed by
//! workers, the `HttpProbe` implementation, and the probe error type.

use crate::probe::session::SignupSession;
use crate::runtime::config::CheckerConfig;
use anyhow::{anyhow, Context, Result};
use futures::future::BoxFuture;
use hyper::client::HttpConnector;
use hyper::header::{CONTENT_TYPE, COOKIE};
use hyper::{Body, Client, Method, Request, StatusCode, Uri};
use hyper_tls::HttpsConnector;
use std::time::Duration;
use tokio::time::timeout;

pub(crate) type ProbeHttpClient = Client<HttpsConnector<HttpConnector>>;

pub(crate) fn build_http_client() -> ProbeHttpClient {
    Client::builder().build::<_, Body>(HttpsConnector::new())
}

/// Outcome of a single availability check.
///
/// Only `Available` qualifies a handle; `Indeterminate` exists for probes
/// that can distinguish "the check itself failed" from "the handle is taken"
/// and is collapsed to non-qualifying by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeVerdict {
    Available,
    Taken,
    Indeterminate,
}

#[derive(Debug)]
pub enum ProbeError {
    Timeout { limit: Duration },
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::Timeout { limit } => {
                write!(f, "probe request timed out after {limit:?}")
            }
        }
    }
}

impl std::error::Error for ProbeError {}

/// Single-handle availability check. Implementations may perform network I/O
/// and must be safe to call concurrently from multiple workers.
pub trait AvailabilityProbe: Send + Sync {
    fn check<'a>(&'a self, handle: &'a str) -> BoxFuture<'a, Result<ProbeVerdict>>;
}

/// Probe that posts a form-encoded signup check to an HTTP endpoint.
///
/// A 200 response means the handle is available; any other status means it is
/// not. Every request is bounded by the configured per-call timeout so one
/// stalled call can never hang a worker.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: ProbeHttpClient,
    endpoint: Uri,
    request_timeout: Duration,
    session: SignupSession,
}

impl AvailabilityProbe for HttpProbe {
    fn check<'a>(&'a self, handle: &'a str) -> BoxFuture<'a, Result<ProbeVerdict>> {
        Box::pin(self.perform(handle))
    }
}

impl HttpProbe {
    pub fn new(endpoint: &str, request_timeout: Duration) -> Result<Self> {
        Self::with_session(endpoint, request_timeout, SignupSession::default())
    }

    pub fn with_session(
        endpoint: &str,
        request_timeout: Duration,
        session: SignupSession,
    ) -> Result<Self> {
        let endpoint: Uri = endpoint
            .parse()
            .with_context(|| format!("invalid probe endpoint {endpoint}"))?;

        Ok(Self {
            client: build_http_client(),
            endpoint,
            request_timeout,
            session,
        })
    }

    /// Builds a probe from the run configuration, bootstrapping the signup
    /// session first when a session URL is configured. A failed bootstrap
    /// degrades to probing without a token rather than aborting the run.
    pub async fn connect(config: &CheckerConfig) -> Result<Self> {
        let client = build_http_client();
        let session = match config.session_url() {
            Some(url) => {
                match SignupSession::fetch(&client, url, config.probe_timeout()).await {
                    Ok(session) => session,
                    Err(err) => {
                        tracing::info!(
                            error = %err,
                            "session bootstrap failed; probing without a signup token"
                        );
                        SignupSession::default()
                    }
                }
            }
            None => SignupSession::default(),
        };

        let endpoint: Uri = config
            .endpoint_url()
            .parse()
            .with_context(|| format!("invalid probe endpoint {}", config.endpoint_url()))?;

        Ok(Self {
            client,
            endpoint,
            request_timeout: config.probe_timeout(),
            session,
        })
    }

    pub fn session(&self) -> &SignupSession {
        &self.session
    }

    async fn perform(&self, handle: &str) -> Result<ProbeVerdict> {
        let body = probe_form_body(handle, &self.session.token);

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        for cookie in &self.session.cookies {
            builder = builder.header(COOKIE, cookie.as_str());
        }
        let request = builder
            .body(Body::from(body))
            .context("failed to build probe request")?;

        let response = timeout(self.request_timeout, self.client.request(request))
            .await
            .map_err(|_| ProbeError::Timeout {
                limit: self.request_timeout,
            })?
            .map_err(|err| anyhow!("probe request failed: {err}"))?;

        let status = response.status();
        tracing::trace!(handle, status = status.as_u16(), "signup check answered");

        if status == StatusCode::OK {
            Ok(ProbeVerdict::Available)
        } else {
            Ok(ProbeVerdict::Taken)
        }
    }
}

pub(crate) fn probe_form_body(handle: &str, token: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("value", handle)
        .append_pair("authenticity_token", token)
        .finish()
}
