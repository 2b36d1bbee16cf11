//! Per-user token store persisted as YAML.
//!
//! The file lives at `<config dir>/registrytools/config.yaml` and maps
//! registry hostnames to access tokens. Saves replace the whole file through
//! a temp file and rename, so two concurrent logins lose one update instead
//! of tearing the file.

use crate::credentials::AccessToken;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Directory under the user config dir that holds our files
pub const CONFIG_DIR_NAME: &str = "registrytools";
/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Token stored for a single registry host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCredential {
    /// Registry hostname
    pub hostname: String,
    /// Access token for the host
    pub token: AccessToken,
}

/// Serialized shape of the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Host credentials in insertion order
    #[serde(default)]
    pub hosts: Vec<HostCredential>,
    /// CLI version that last wrote the file
    #[serde(default)]
    pub created_by_version: String,
}

/// Loads, mutates and saves the user config file
#[derive(Debug)]
pub struct TokenStore {
    path: PathBuf,
    config: UserConfig,
}

impl TokenStore {
    /// Default config file location for the current user
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Empty store backed by `path`, without reading it
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: UserConfig::default(),
        }
    }

    /// Load the store from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path()?)
    }

    /// Load the store from `path`.
    ///
    /// A missing file yields an empty config. A directory at `path` or
    /// malformed contents are errors.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();

        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::trace!("No user config at {}, starting empty", path.display());
                return Ok(Self {
                    path,
                    config: UserConfig::default(),
                });
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        if metadata.is_dir() {
            return Err(ConfigError::IsDirectory { path });
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let config = if contents.trim().is_empty() {
            UserConfig::default()
        } else {
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Decode {
                path: path.clone(),
                source,
            })?
        };

        Ok(Self { path, config })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current in-memory config
    pub fn config(&self) -> &UserConfig {
        &self.config
    }

    /// Token stored for `hostname`, if any
    pub fn token(&self, hostname: &str) -> Option<&AccessToken> {
        self.config
            .hosts
            .iter()
            .find(|host| host.hostname == hostname)
            .map(|host| &host.token)
    }

    /// Insert or replace the token for `hostname`, keeping entry order
    pub fn set_token(&mut self, hostname: &str, token: AccessToken) {
        if let Some(host) = self
            .config
            .hosts
            .iter_mut()
            .find(|host| host.hostname == hostname)
        {
            host.token = token;
            return;
        }

        self.config.hosts.push(HostCredential {
            hostname: hostname.to_string(),
            token,
        });
    }

    /// Write the whole config to disk, stamped with `creator_version`
    pub fn save(&mut self, creator_version: &str) -> Result<(), ConfigError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        create_private_dir(&dir).map_err(|source| ConfigError::Write {
            path: dir.clone(),
            source,
        })?;

        self.config.created_by_version = creator_version.to_string();
        let data = serde_yaml::to_string(&self.config).map_err(ConfigError::Encode)?;

        let write_error = |source: std::io::Error| ConfigError::Write {
            path: self.path.clone(),
            source,
        };

        // NamedTempFile is created 0600 on unix
        let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(write_error)?;
        file.write_all(data.as_bytes()).map_err(write_error)?;
        file.as_file().sync_all().map_err(write_error)?;
        file.persist(&self.path)
            .map_err(|e| write_error(e.error))?;

        log::debug!("Saved user config to {}", self.path.display());
        Ok(())
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}
