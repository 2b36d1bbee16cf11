//! OAuth client-credentials exchange against the registry.

use super::{AccessToken, TokenExchanger};
use crate::error::CredentialError;
use crate::host::Hostname;
use crate::net::{self, SendError};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

/// Path of the token endpoint on a registry host
pub const TOKEN_PATH: &str = "/auth/token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Exchanges client credentials over HTTPS
#[derive(Debug, Clone)]
pub struct HttpTokenExchanger {
    http_client: reqwest::Client,
}

impl HttpTokenExchanger {
    /// Create an exchanger sharing `http_client`
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

impl TokenExchanger for HttpTokenExchanger {
    async fn exchange(
        &self,
        host: &Hostname,
        client_id: &str,
        client_secret: &AccessToken,
        cancel: &CancellationToken,
    ) -> Result<AccessToken, CredentialError> {
        let exchange_error = |reason: String| CredentialError::Exchange {
            host: host.to_string(),
            reason,
        };

        let request = self
            .http_client
            .post(host.url(TOKEN_PATH))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret.expose()),
            ])
            .timeout(net::REQUEST_TIMEOUT);

        let response = net::send(request, cancel).await.map_err(|e| match e {
            SendError::Cancelled => CredentialError::Cancelled,
            SendError::Transport(e) => exchange_error(e.to_string()),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = net::error_body(response).await;
            return Err(exchange_error(format!("HTTP {status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| exchange_error(format!("invalid token response: {e}")))?;

        if let Some(expires_in) = token.expires_in {
            log::trace!("Issued token for {host} expires in {expires_in}s");
        }

        Ok(AccessToken::new(token.access_token))
    }
}
