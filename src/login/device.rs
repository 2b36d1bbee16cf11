//! Device authorization transport (RFC 8628) over HTTPS.

use crate::credentials::AccessToken;
use crate::error::LoginError;
use crate::host::Hostname;
use crate::net::{self, SendError};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// OAuth client id registered for the CLI
pub const CLIENT_ID: &str = "rt-cli";
/// Scope requested at login
pub const SCOPE: &str = "owner";

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
const DEFAULT_INTERVAL_SECS: u64 = 5;
const DEFAULT_EXPIRES_IN_SECS: u64 = 900;

/// Endpoint URLs derived from a registry host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoints {
    /// Issues device and user codes
    pub device_code_url: String,
    /// Polled for the access token
    pub token_url: String,
    /// Browser login page
    pub authorize_url: String,
}

impl DeviceEndpoints {
    /// Endpoints for `host`
    pub fn for_host(host: &Hostname) -> Self {
        Self {
            device_code_url: host.url("/auth/device/code"),
            token_url: host.url("/auth/token"),
            authorize_url: host.url("/login"),
        }
    }
}

/// Device code grant issued by the authorization server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCode {
    /// Opaque code used when polling
    pub device_code: String,
    /// Short code the user types in the browser
    pub user_code: String,
    /// Page where the user enters the code
    pub verification_uri: String,
    /// Lifetime of the device code
    pub expires_in: Duration,
    /// Minimum delay between polls
    pub interval: Duration,
}

/// Outcome of a single token poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResponse {
    /// User has not approved yet
    Pending,
    /// Polling too fast; back off
    SlowDown,
    /// User approved and a token was issued
    Granted(AccessToken),
    /// Device code expired
    Expired,
    /// User rejected the request
    Denied,
}

/// Transport for the device authorization grant
pub trait DeviceAuthorizationProvider {
    /// Request a device code and user code
    fn request_device_code(
        &self,
        endpoints: &DeviceEndpoints,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<DeviceCode, LoginError>>;

    /// Poll the token endpoint once
    fn poll_for_token(
        &self,
        endpoints: &DeviceEndpoints,
        code: &DeviceCode,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<PollResponse, LoginError>>;
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    #[serde(alias = "verification_url")]
    verification_uri: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    interval: Option<u64>,
}

impl DeviceCodeResponse {
    /// Missing or zero timings fall back to the defaults
    fn into_device_code(self) -> DeviceCode {
        let seconds = |value: Option<u64>, default: u64| {
            Duration::from_secs(value.filter(|&v| v > 0).unwrap_or(default))
        };
        DeviceCode {
            device_code: self.device_code,
            user_code: self.user_code,
            verification_uri: self.verification_uri,
            expires_in: seconds(self.expires_in, DEFAULT_EXPIRES_IN_SECS),
            interval: seconds(self.interval, DEFAULT_INTERVAL_SECS),
        }
    }
}

/// Token endpoint response: either a token or an OAuth error code.
///
/// `Success` must stay first so the untagged decoder tries it before `Error`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TokenPollingResponse {
    Success { access_token: String },
    Error { error: String },
}

/// Device flow over HTTPS with form-encoded requests
#[derive(Debug, Clone)]
pub struct HttpDeviceFlowProvider {
    http_client: reqwest::Client,
}

impl HttpDeviceFlowProvider {
    /// Create a provider sharing `http_client`
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

impl DeviceAuthorizationProvider for HttpDeviceFlowProvider {
    async fn request_device_code(
        &self,
        endpoints: &DeviceEndpoints,
        cancel: &CancellationToken,
    ) -> Result<DeviceCode, LoginError> {
        let request = self
            .http_client
            .post(&endpoints.device_code_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[("client_id", CLIENT_ID), ("scope", SCOPE)])
            .timeout(net::REQUEST_TIMEOUT);

        let response = net::send(request, cancel).await.map_err(|e| match e {
            SendError::Cancelled => LoginError::Cancelled,
            SendError::Transport(e) => LoginError::DeviceAuthorization(e.to_string()),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = net::error_body(response).await;
            return Err(LoginError::DeviceAuthorization(format!(
                "HTTP {status}: {body}"
            )));
        }

        let code: DeviceCodeResponse = response
            .json()
            .await
            .map_err(|e| LoginError::DeviceAuthorization(e.to_string()))?;
        Ok(code.into_device_code())
    }

    async fn poll_for_token(
        &self,
        endpoints: &DeviceEndpoints,
        code: &DeviceCode,
        cancel: &CancellationToken,
    ) -> Result<PollResponse, LoginError> {
        let request = self
            .http_client
            .post(&endpoints.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", DEVICE_CODE_GRANT),
                ("device_code", code.device_code.as_str()),
                ("client_id", CLIENT_ID),
            ])
            .timeout(net::REQUEST_TIMEOUT);

        let response = net::send(request, cancel).await.map_err(|e| match e {
            SendError::Cancelled => LoginError::Cancelled,
            SendError::Transport(e) => LoginError::Polling(e.to_string()),
        })?;

        // Pending and expired codes come back as 400 with a JSON error body
        let status = response.status();
        if status.is_server_error() {
            let body = net::error_body(response).await;
            return Err(LoginError::Polling(format!("HTTP {status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LoginError::Polling(e.to_string()))?;
        parse_poll_response(&body)
    }
}

fn parse_poll_response(body: &str) -> Result<PollResponse, LoginError> {
    let parsed: TokenPollingResponse = serde_json::from_str(body)
        .map_err(|e| LoginError::Polling(format!("invalid token response: {e}")))?;

    match parsed {
        TokenPollingResponse::Success { access_token } => {
            Ok(PollResponse::Granted(AccessToken::new(access_token)))
        }
        TokenPollingResponse::Error { error } => match error.as_str() {
            "authorization_pending" => Ok(PollResponse::Pending),
            "slow_down" => Ok(PollResponse::SlowDown),
            "expired_token" => Ok(PollResponse::Expired),
            "access_denied" => Ok(PollResponse::Denied),
            other => Err(LoginError::Polling(format!("unknown error: {other}"))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_for_host() {
        let endpoints = DeviceEndpoints::for_host(&Hostname::parse("https://example.com").unwrap());
        assert_eq!(endpoints.device_code_url, "https://example.com/auth/device/code");
        assert_eq!(endpoints.token_url, "https://example.com/auth/token");
        assert_eq!(endpoints.authorize_url, "https://example.com/login");
    }

    #[test]
    fn test_parse_poll_responses() {
        assert_eq!(
            parse_poll_response(r#"{"error":"authorization_pending"}"#).unwrap(),
            PollResponse::Pending
        );
        assert_eq!(
            parse_poll_response(r#"{"error":"slow_down"}"#).unwrap(),
            PollResponse::SlowDown
        );
        assert_eq!(
            parse_poll_response(r#"{"error":"expired_token"}"#).unwrap(),
            PollResponse::Expired
        );
        assert_eq!(
            parse_poll_response(r#"{"error":"access_denied"}"#).unwrap(),
            PollResponse::Denied
        );
        assert_eq!(
            parse_poll_response(r#"{"access_token":"tok","token_type":"bearer"}"#).unwrap(),
            PollResponse::Granted(AccessToken::new("tok"))
        );
    }

    #[test]
    fn test_zero_interval_uses_default() {
        let response: DeviceCodeResponse = serde_json::from_str(
            r#"{"device_code":"d","user_code":"U","verification_uri":"https://example.com/login","expires_in":600,"interval":0}"#,
        )
        .unwrap();
        let code = response.into_device_code();
        assert_eq!(code.interval, Duration::from_secs(DEFAULT_INTERVAL_SECS));
        assert_eq!(code.expires_in, Duration::from_secs(600));
    }

    #[test]
    fn test_missing_timings_use_defaults() {
        let response: DeviceCodeResponse = serde_json::from_str(
            r#"{"device_code":"d","user_code":"U","verification_url":"https://example.com/login"}"#,
        )
        .unwrap();
        let code = response.into_device_code();
        assert_eq!(code.interval, Duration::from_secs(5));
        assert_eq!(code.expires_in, Duration::from_secs(900));
    }

    #[test]
    fn test_parse_unknown_error_fails() {
        assert!(matches!(
            parse_poll_response(r#"{"error":"unsupported_grant_type"}"#),
            Err(LoginError::Polling(_))
        ));
    }
}
