//! Module coordinates and directory naming conventions.

use crate::error::ValidationError;
use crate::host::Hostname;
use std::path::{Path, PathBuf};

/// System used when none can be derived
pub const DEFAULT_SYSTEM: &str = "null";

const DIRECTORY_PREFIX: &str = "terraform-";

/// Everything needed to publish one module version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    /// First path segment, such as `platform`
    pub namespace: String,
    /// Module name, such as `networking`
    pub name: String,
    /// Provider system, such as `aws`
    pub system: String,
    /// Semantic version string
    pub version: String,
    /// Source directory to pack
    pub directory: PathBuf,
}

/// Name and system derived from a directory basename.
///
/// `terraform-aws-vpc` yields `("vpc", "aws")`, `terraform-vpc` yields
/// `("vpc", "null")`, anything else yields `(basename, "null")`.
pub fn names_from_directory(directory: &Path) -> (String, String) {
    let base = directory
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    if base.starts_with(DIRECTORY_PREFIX) {
        let parts: Vec<&str> = base.splitn(3, '-').collect();
        match parts.as_slice() {
            [_, system, name] => return ((*name).to_string(), (*system).to_string()),
            [_, name] => return ((*name).to_string(), DEFAULT_SYSTEM.to_string()),
            _ => {}
        }
    }

    (base, DEFAULT_SYSTEM.to_string())
}

impl ModuleSpec {
    /// Check required fields and the version format
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("namespace", &self.namespace),
            ("version", &self.version),
            ("name", &self.name),
            ("system", &self.system),
        ];
        for (argument, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingArgument { argument });
            }
        }

        semver::Version::parse(&self.version).map_err(|source| {
            ValidationError::InvalidVersion {
                version: self.version.clone(),
                source,
            }
        })?;

        for (argument, value) in [
            ("namespace", &self.namespace),
            ("name", &self.name),
            ("system", &self.system),
        ] {
            if value.contains('/') || value.chars().any(char::is_whitespace) {
                return Err(ValidationError::InvalidArgument {
                    argument,
                    reason: format!("'{value}' must not contain '/' or whitespace"),
                });
            }
        }

        Ok(())
    }

    /// Registry source address, `host/namespace/name/system`
    pub fn source(&self, host: &Hostname) -> String {
        format!("{host}/{}/{}/{}", self.namespace, self.name, self.system)
    }

    /// Upload filename, `name-system-version`
    pub fn archive_name(&self) -> String {
        format!("{}-{}-{}", self.name, self.system, self.version)
    }
}
