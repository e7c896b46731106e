//! Upstream GET relay.

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::response::{ResponseSink, respond_success_body};

/// Shared outbound HTTP client.
///
/// Adds no headers or auth of its own; every relay is a plain GET.
#[derive(Debug, Clone, Default)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    /// Create a client, optionally bounding each request by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

/// GET `url` and relay the upstream body into `res` with `200 OK`.
///
/// Exactly one attempt is made. On failure, including a non-2xx upstream
/// status, the error is returned for the caller's error path and `res` is left
/// unwritten.
///
/// # Errors
///
/// Returns `AppError::Upstream` if the request fails.
pub async fn simple_http_request(
    client: &UpstreamClient,
    url: &str,
    res: &mut ResponseSink,
) -> Result<()> {
    let body = fetch(client, url).await.map_err(|e| {
        tracing::debug!(url, error = %e, "Upstream request failed");
        AppError::Upstream(e)
    })?;

    respond_success_body(res, body);
    Ok(())
}

async fn fetch(client: &UpstreamClient, url: &str) -> reqwest::Result<axum::body::Bytes> {
    client
        .client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await
}
