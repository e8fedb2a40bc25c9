use reqwest::{Client, Response};
use shared::{Error, Result};
use std::time::Duration;

/// Shared HTTP client for upstream calls. Every request is bounded by `timeout`.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(format!("pitchside/{}", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Internal(format!("failed to build HTTP client: {}", e)))
}

/// Map a non-success status to [`Error::UpstreamUnavailable`].
pub(crate) async fn ensure_success(upstream: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    Err(Error::UpstreamUnavailable(format!(
        "{} returned {}: {}",
        upstream, status, snippet
    )))
}
