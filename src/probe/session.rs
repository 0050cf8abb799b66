//! Signup-session bootstrap.
//!
//! The signup-check endpoint expects the anti-CSRF token and cookies handed
//! out with the signup page. The session is captured once per run, before any
//! worker starts, and replayed verbatim on every probe request.

use crate::probe::client::{ProbeError, ProbeHttpClient};
use anyhow::{anyhow, Context, Result};
use hyper::header::SET_COOKIE;
use hyper::Uri;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tokio::time::timeout;

// The token input can carry its attributes in either order.
static TOKEN_NAME_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"name="authenticity_token"[^>]*value="([^"]*)""#)
        .expect("token pattern must compile")
});
static TOKEN_VALUE_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"value="([^"]*)"[^>]*name="authenticity_token""#)
        .expect("token pattern must compile")
});

/// Anti-CSRF token and cookies captured from the signup page.
///
/// Both fields may be empty: a failed bootstrap degrades to probing without
/// them, which the endpoint may or may not accept.
#[derive(Debug, Default, Clone)]
pub struct SignupSession {
    pub token: String,
    pub cookies: Vec<String>,
}

impl SignupSession {
    /// Fetches the signup page, extracting the hidden `authenticity_token`
    /// input and any `Set-Cookie` headers.
    pub(crate) async fn fetch(
        client: &ProbeHttpClient,
        url: &str,
        request_timeout: Duration,
    ) -> Result<Self> {
        let uri: Uri = url
            .parse()
            .with_context(|| format!("invalid session URL {url}"))?;

        let response = timeout(request_timeout, client.get(uri))
            .await
            .map_err(|_| ProbeError::Timeout {
                limit: request_timeout,
            })?
            .map_err(|err| anyhow!("session request failed: {err}"))?;

        let cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .map(str::to_owned)
            .collect();

        let body = hyper::body::to_bytes(response.into_body())
            .await
            .context("failed to read session page body")?;
        let html = String::from_utf8_lossy(&body);
        let token = extract_token(&html).unwrap_or_default();

        if token.is_empty() {
            tracing::debug!(url, "session page carried no authenticity token");
        }

        Ok(Self { token, cookies })
    }
}

/// Pulls the `authenticity_token` hidden-input value out of an HTML page.
pub(crate) fn extract_token(html: &str) -> Option<String> {
    TOKEN_NAME_FIRST
        .captures(html)
        .or_else(|| TOKEN_VALUE_FIRST.captures(html))
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str().to_owned())
}
