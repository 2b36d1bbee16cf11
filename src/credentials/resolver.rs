//! Credential precedence resolution.
//!
//! Sources are checked in a fixed order and the first match wins:
//! 1. `REGISTRY_TOOLS_CLIENT_ID` + `REGISTRY_TOOLS_CLIENT_SECRET` (exchanged for a token)
//! 2. `REGISTRY_TOOLS_TOKEN`
//! 3. Token stored by `rt login` for the host
//!
//! Only the first source touches the network.

use super::AccessToken;
use crate::config::{CLIENT_ID_ENV, CLIENT_SECRET_ENV, EnvConfig, TOKEN_ENV, TokenStore};
use crate::error::CredentialError;
use crate::host::Hostname;
use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Exchanges service credentials for an access token
pub trait TokenExchanger {
    /// Issue a token for `client_id`/`client_secret` against `host`
    fn exchange(
        &self,
        host: &Hostname,
        client_id: &str,
        client_secret: &AccessToken,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<AccessToken, CredentialError>>;
}

/// Where an identity came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// Client id and secret from the environment
    ServiceCredentials,
    /// `REGISTRY_TOOLS_TOKEN`
    ExplicitToken,
    /// Token saved by `rt login`
    StoredToken,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKind::ServiceCredentials => write!(f, "client credentials from environment"),
            CredentialKind::ExplicitToken => write!(f, "{TOKEN_ENV}"),
            CredentialKind::StoredToken => write!(f, "user config"),
        }
    }
}

/// Selected credential source, before any exchange happens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Exchange client credentials for a token
    ServiceCredentials {
        /// Client identifier
        client_id: String,
        /// Client secret
        client_secret: AccessToken,
    },
    /// Token given in the environment
    ExplicitToken(AccessToken),
    /// Token from the token store
    StoredToken(AccessToken),
    /// Nothing configured
    Missing,
}

/// Resolved identity for registry calls
#[derive(Debug, Clone)]
pub struct Identity {
    /// Registry host the token is valid for
    pub host: Hostname,
    /// Bearer token
    pub token: AccessToken,
    /// Source of the token
    pub kind: CredentialKind,
}

/// Picks and materializes credentials for a host
pub struct CredentialResolver<'a, X> {
    env: &'a EnvConfig,
    store: &'a TokenStore,
    exchanger: X,
}

impl<'a, X: TokenExchanger> CredentialResolver<'a, X> {
    /// Create a resolver over an environment snapshot and a loaded token store
    pub fn new(env: &'a EnvConfig, store: &'a TokenStore, exchanger: X) -> Self {
        Self {
            env,
            store,
            exchanger,
        }
    }

    /// Choose the credential source for `host` without side effects
    pub fn select_source(&self, host: &Hostname) -> CredentialSource {
        if let (Some(client_id), Some(client_secret)) =
            (self.env.get(CLIENT_ID_ENV), self.env.get(CLIENT_SECRET_ENV))
        {
            return CredentialSource::ServiceCredentials {
                client_id,
                client_secret: AccessToken::new(client_secret),
            };
        }

        if let Some(token) = self.env.get(TOKEN_ENV) {
            return CredentialSource::ExplicitToken(AccessToken::new(token));
        }

        if let Some(token) = self.store.token(host.as_str()) {
            return CredentialSource::StoredToken(token.clone());
        }

        CredentialSource::Missing
    }

    /// Resolve an identity for `host`
    pub async fn resolve(
        &self,
        host: &Hostname,
        cancel: &CancellationToken,
    ) -> Result<Identity, CredentialError> {
        let (token, kind) = match self.select_source(host) {
            CredentialSource::ServiceCredentials {
                client_id,
                client_secret,
            } => {
                log::trace!("Exchanging client credentials from environment for {host}");
                let token = self
                    .exchanger
                    .exchange(host, &client_id, &client_secret, cancel)
                    .await?;
                (token, CredentialKind::ServiceCredentials)
            }
            CredentialSource::ExplicitToken(token) => (token, CredentialKind::ExplicitToken),
            CredentialSource::StoredToken(token) => (token, CredentialKind::StoredToken),
            CredentialSource::Missing => return Err(CredentialError::LoginRequired),
        };

        log::debug!("Using {kind} for {host}");
        Ok(Identity {
            host: host.clone(),
            token,
            kind,
        })
    }
}
