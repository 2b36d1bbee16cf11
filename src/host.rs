//! Registry hostname normalization.

use std::fmt;
use thiserror::Error;

/// Hostname that could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid hostname '{0}'")]
pub struct InvalidHostname(pub String);

/// Registry hostname in comparison form: no scheme, no path, lower case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hostname(String);

impl Hostname {
    /// Parse a user-supplied hostname, tolerating an `http://` or `https://` prefix
    pub fn parse(raw: &str) -> Result<Self, InvalidHostname> {
        let trimmed = strip_scheme(raw.trim());
        if trimmed.is_empty() {
            return Err(InvalidHostname(raw.to_string()));
        }

        let url = url::Url::parse(&format!("https://{trimmed}"))
            .map_err(|_| InvalidHostname(raw.to_string()))?;

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| InvalidHostname(raw.to_string()))?
            .to_ascii_lowercase();

        match url.port() {
            Some(port) => Ok(Self(format!("{host}:{port}"))),
            None => Ok(Self(host)),
        }
    }

    /// Hostname as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `https://<host><path>`
    pub fn url(&self, path: &str) -> String {
        format!("https://{}{}", self.0, path)
    }

    /// Name of the environment variable Terraform reads a token for this host from
    pub fn terraform_token_env(&self) -> String {
        let escaped = self.0.replace('-', "__").replace('.', "_");
        format!("TF_TOKEN_{escaped}")
    }

    /// Page where users create registry credentials
    pub fn provision_url(&self) -> String {
        self.url("/provision")
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remove a leading `https://` or `http://`
pub fn strip_scheme(raw: &str) -> &str {
    raw.strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
        .unwrap_or(raw)
}
