//! Shared HTTP plumbing: client construction and cancellable sends.

use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Per-request timeout for API calls
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for archive uploads, which can be large
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Failure to get a response at all
#[derive(Error, Debug)]
pub enum SendError {
    /// Caller cancelled the request
    #[error("request cancelled")]
    Cancelled,

    /// Transport failure
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Build the HTTP client used for all registry traffic
pub fn build_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("rt/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .build()
}

/// Send `request`, aborting as soon as `cancel` fires
pub async fn send(
    request: reqwest::RequestBuilder,
    cancel: &CancellationToken,
) -> Result<reqwest::Response, SendError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(SendError::Cancelled),
        response = request.send() => Ok(response?),
    }
}

/// Read a response body for error reporting
pub async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "(failed to read error body)".to_string())
}
