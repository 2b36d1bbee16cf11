//! Snapshot of the process environment.
//!
//! Commands read configuration through [`EnvConfig`] instead of calling
//! `std::env::var` directly, so tests can hand in an explicit environment.

use std::collections::HashMap;

/// Registry hostname override
pub const HOSTNAME_ENV: &str = "REGISTRY_TOOLS_HOSTNAME";
/// Explicit pre-issued access token
pub const TOKEN_ENV: &str = "REGISTRY_TOOLS_TOKEN";
/// Service client identifier
pub const CLIENT_ID_ENV: &str = "REGISTRY_TOOLS_CLIENT_ID";
/// Service client secret
pub const CLIENT_SECRET_ENV: &str = "REGISTRY_TOOLS_CLIENT_SECRET";
/// Log filter
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Default registry host for Registry Tools Cloud
pub const DEFAULT_HOSTNAME: &str = "registrytools.cloud";

/// Immutable view of environment variables
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    vars: HashMap<String, String>,
}

impl EnvConfig {
    /// Capture the current process environment
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build an environment from explicit pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of `key`, treating empty values as unset
    pub fn get(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .filter(|value| !value.is_empty())
            .cloned()
    }

    /// Whether `key` is set to exactly `expected`
    pub fn is(&self, key: &str, expected: &str) -> bool {
        self.vars.get(key).is_some_and(|value| value == expected)
    }

    /// Registry host from the environment, or the default host
    pub fn hostname(&self) -> String {
        self.get(HOSTNAME_ENV)
            .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string())
    }
}
