//! Access token wrapper that keeps secrets out of logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bearer token for registry API requests.
///
/// `Debug` and `Display` never print the secret; use [`AccessToken::expose`]
/// at the point where the token goes on the wire.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token value
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Masked form for display (first and last 4 chars of long tokens)
    pub fn masked(&self) -> String {
        let token = &self.0;
        let count = token.chars().count();
        if count <= 8 {
            return "*".repeat(count);
        }
        let head: String = token.chars().take(4).collect();
        let tail: String = token.chars().skip(count - 4).collect();
        format!("{head}****{tail}")
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken({})", self.masked())
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}
