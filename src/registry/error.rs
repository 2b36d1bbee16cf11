//! Registry API failures before publish-stage classification.

use serde::Deserialize;
use thiserror::Error;

/// Raw failure from a registry call
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request cancelled by the caller
    #[error("request cancelled")]
    Cancelled,

    /// No response received
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// Non-success response
    #[error("{message}")]
    Response {
        /// HTTP status code
        status: u16,
        /// Human-readable error summary
        message: String,
    },

    /// Response body did not have the expected shape
    #[error("unexpected response from registry: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct ErrorDocument {
    #[serde(default)]
    errors: Vec<ErrorObject>,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl ApiError {
    /// Classify a non-success response from its status and body.
    ///
    /// JSON:API error documents become `"title: detail"` entries joined
    /// with `"; "`. Anything else falls back to the status line.
    pub fn from_parts(status: u16, body: &str) -> Self {
        let formatted = serde_json::from_str::<ErrorDocument>(body)
            .ok()
            .map(|doc| {
                doc.errors
                    .into_iter()
                    .filter_map(format_error_object)
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .filter(|message| !message.is_empty());

        let message = formatted.unwrap_or_else(|| {
            let reason = reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|code| code.canonical_reason())
                .unwrap_or("Unexpected status");
            format!("{reason} (HTTP {status})")
        });

        ApiError::Response { status, message }
    }

    /// Whether the registry answered "not found"
    pub fn is_not_found(&self) -> bool {
        match self {
            ApiError::Response { status, message } => {
                *status == 404 || message.contains("Not found")
            }
            _ => false,
        }
    }
}

fn format_error_object(error: ErrorObject) -> Option<String> {
    match (error.title, error.detail) {
        (Some(title), Some(detail)) if !detail.is_empty() => Some(format!("{title}: {detail}")),
        (Some(title), _) => Some(title),
        (None, Some(detail)) => Some(detail),
        (None, None) => None,
    }
}
