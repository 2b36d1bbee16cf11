//! Error types for registry tools operations.
//!
//! Every failure is classified into one family so that the command layer can
//! map it to exactly one exit code and a set of recovery suggestions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for registry tools operations
pub type Result<T> = std::result::Result<T, RtError>;

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for generic, validation, upstream failures and declined confirmation
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for archive and file I/O failures
pub const EXIT_IO: i32 = 2;
/// Exit code for credential resolution and client construction failures
pub const EXIT_CREDENTIALS: i32 = 127;

/// Main error type for all registry tools operations
#[derive(Error, Debug)]
pub enum RtError {
    /// User config (token store) errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Credential resolution errors
    #[error("{0}")]
    Credential(#[from] CredentialError),

    /// Module argument validation errors
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Archive packing and file I/O errors
    #[error("{0}")]
    Archive(#[from] ArchiveError),

    /// Registry API errors
    #[error("{0}")]
    Upstream(#[from] UpstreamError),

    /// Device login errors
    #[error("Login failed: {0}")]
    Login(#[from] LoginError),

    /// Console input errors
    #[error("Cannot read user input: {0}")]
    Input(#[source] std::io::Error),

    /// GitHub Actions environment errors
    #[error("{0}")]
    Actions(String),

    /// Interrupted while waiting on the user
    #[error("Operation cancelled")]
    Cancelled,
}

/// User config errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No per-user config directory on this platform
    #[error("Could not determine the user config directory")]
    NoConfigDir,

    /// Config path exists but is a directory
    #[error("Error loading user config: {path} is a directory")]
    IsDirectory {
        /// Config file path
        path: PathBuf,
    },

    /// Config file could not be read
    #[error("Error reading user config {path}: {source}")]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file contents are malformed
    #[error("Error decoding user config {path}: {source}")]
    Decode {
        /// Config file path
        path: PathBuf,
        /// YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// Config could not be serialized
    #[error("Error encoding user config: {0}")]
    Encode(#[source] serde_yaml::Error),

    /// Config file could not be written
    #[error("Error writing user config {path}: {source}")]
    Write {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Credential resolution errors
#[derive(Error, Debug)]
pub enum CredentialError {
    /// No credential source is available
    #[error(
        "No credentials found. Set the credentials in the environment or use `rt login`"
    )]
    LoginRequired,

    /// Service credential exchange failed
    #[error("Failed to exchange client credentials with {host}: {reason}")]
    Exchange {
        /// Registry host
        host: String,
        /// Reason for the error
        reason: String,
    },

    /// Registry client could not be constructed
    #[error("Failed to create registry client: {reason}")]
    ClientConstruction {
        /// Reason for the error
        reason: String,
    },

    /// Request cancelled before a token was issued
    #[error("Credential exchange cancelled")]
    Cancelled,
}

/// Module argument validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Required argument is missing or empty
    #[error("Required argument \"{argument}\" is missing")]
    MissingArgument {
        /// Argument name
        argument: &'static str,
    },

    /// Version is not a semantic version
    #[error("Invalid version '{version}': {source}")]
    InvalidVersion {
        /// Version string
        version: String,
        /// Parsing error
        #[source]
        source: semver::Error,
    },

    /// Invalid argument value
    #[error("Invalid argument \"{argument}\": {reason}")]
    InvalidArgument {
        /// Argument name
        argument: &'static str,
        /// Reason for the error
        reason: String,
    },
}

/// Archive and file I/O errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Source directory could not be packed
    #[error("Failed to pack directory {directory}: {reason}")]
    Pack {
        /// Source directory
        directory: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Filesystem operation on the archive failed
    #[error("Failed to {operation} {path}: {source}")]
    Io {
        /// Operation that failed
        operation: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Registry API errors after classification
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Upload stage was rejected with "not found", usually a stale token
    #[error("authentication failed, check your credentials or re-run 'rt login'")]
    Authentication,

    /// Registration stage was rejected with "not found"
    #[error("namespace does not exist or you do not have permission to publish to it")]
    Permission,

    /// Any other upstream failure, formatted for humans
    #[error("{0}")]
    Unclassified(String),

    /// Request cancelled by the caller
    #[error("Request cancelled")]
    Cancelled,
}

/// Device login errors
#[derive(Error, Debug)]
pub enum LoginError {
    /// Device code request failed
    #[error("device authorization failed: {0}")]
    DeviceAuthorization(String),

    /// Token polling failed
    #[error("device token polling failed: {0}")]
    Polling(String),

    /// Device code expired before the user approved it
    #[error("device code expired, please run `rt login` again")]
    Expired,

    /// User denied the authorization request
    #[error("authorization was denied")]
    Denied,

    /// Login abandoned by the user
    #[error("login cancelled")]
    Cancelled,

    /// Invalid login hostname
    #[error("invalid hostname '{0}'")]
    InvalidHost(String),
}

/// Summary rendering errors
#[derive(Error, Debug)]
pub enum SummaryError {
    /// Template failed to parse
    #[error("failed to parse template: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    /// Template failed to render
    #[error("failed to execute template: {0}")]
    Render(#[from] Box<handlebars::RenderError>),
}

impl RtError {
    /// Exit code family for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            RtError::Credential(_) => EXIT_CREDENTIALS,
            RtError::Archive(_) => EXIT_IO,
            _ => EXIT_FAILURE,
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            RtError::Credential(CredentialError::LoginRequired) => vec![
                "Log in interactively: rt login".to_string(),
                "Or set REGISTRY_TOOLS_CLIENT_ID and REGISTRY_TOOLS_CLIENT_SECRET".to_string(),
                "Or set REGISTRY_TOOLS_TOKEN in automation".to_string(),
            ],
            RtError::Credential(CredentialError::Exchange { .. }) => vec![
                "Verify REGISTRY_TOOLS_CLIENT_ID and REGISTRY_TOOLS_CLIENT_SECRET".to_string(),
            ],
            RtError::Upstream(UpstreamError::Authentication) => vec![
                "Re-authenticate: rt login".to_string(),
                "Verify REGISTRY_TOOLS_TOKEN has not expired".to_string(),
            ],
            RtError::Upstream(UpstreamError::Permission) => vec![
                "Check the --namespace value".to_string(),
                "Ask an organization owner for publish permission".to_string(),
            ],
            RtError::Validation(ValidationError::MissingArgument { argument }) => {
                vec![format!("Pass --{argument}=<value>")]
            }
            RtError::Config(ConfigError::IsDirectory { path })
            | RtError::Config(ConfigError::Decode { path, .. }) => vec![format!(
                "Remove or repair {} and run `rt login` again",
                path.display()
            )],
            _ => Vec::new(),
        }
    }
}

impl From<handlebars::TemplateError> for SummaryError {
    fn from(error: handlebars::TemplateError) -> Self {
        SummaryError::Template(Box::new(error))
    }
}

impl From<handlebars::RenderError> for SummaryError {
    fn from(error: handlebars::RenderError) -> Self {
        SummaryError::Render(Box::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_families() {
        assert_eq!(RtError::from(CredentialError::LoginRequired).exit_code(), 127);
        assert_eq!(
            RtError::from(ValidationError::MissingArgument { argument: "namespace" }).exit_code(),
            1
        );
        let io = ArchiveError::Io {
            operation: "stat",
            path: PathBuf::from("/tmp/slug"),
            source: std::io::Error::other("boom"),
        };
        assert_eq!(RtError::from(io).exit_code(), 2);
        assert_eq!(RtError::from(UpstreamError::Authentication).exit_code(), 1);
        assert_eq!(RtError::from(UpstreamError::Permission).exit_code(), 1);
    }

    #[test]
    fn test_upstream_messages_are_distinct() {
        let auth = UpstreamError::Authentication.to_string();
        let perm = UpstreamError::Permission.to_string();
        assert!(auth.contains("check your credentials"));
        assert!(perm.contains("namespace does not exist"));
        assert_ne!(auth, perm);
    }
}
