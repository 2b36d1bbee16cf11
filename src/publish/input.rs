//! Where module coordinates come from: CLI flags or GitHub Actions inputs.

use crate::actions::{self, GITHUB_REPOSITORY_ENV};
use crate::config::EnvConfig;
use crate::error::ValidationError;
use crate::module::{DEFAULT_SYSTEM, ModuleSpec, names_from_directory};
use std::path::{Path, PathBuf};

/// Produces the module to publish
pub trait ModuleSpecSource {
    /// Assemble a module spec, applying defaults
    fn module_spec(&self) -> Result<ModuleSpec, ValidationError>;
}

/// `rt publish` flags, defaulted from the directory name
#[derive(Debug, Clone, Default)]
pub struct CliModuleArgs {
    /// `--namespace`
    pub namespace: Option<String>,
    /// `--version`
    pub version: Option<String>,
    /// `--name`
    pub name: Option<String>,
    /// `--system`
    pub system: Option<String>,
    /// `--directory`
    pub directory: Option<PathBuf>,
    /// Working directory used for relative paths and defaults
    pub cwd: PathBuf,
}

impl ModuleSpecSource for CliModuleArgs {
    fn module_spec(&self) -> Result<ModuleSpec, ValidationError> {
        let directory = resolve_directory(&self.cwd, self.directory.as_deref());
        let (default_name, default_system) = names_from_directory(&directory);

        Ok(ModuleSpec {
            namespace: self.namespace.clone().unwrap_or_default(),
            version: self.version.clone().unwrap_or_default(),
            name: self.name.clone().unwrap_or(default_name),
            system: self.system.clone().unwrap_or(default_system),
            directory,
        })
    }
}

/// Inputs of the GitHub Action
#[derive(Debug, Clone)]
pub struct ActionInputs<'a> {
    env: &'a EnvConfig,
    cwd: PathBuf,
}

impl<'a> ActionInputs<'a> {
    /// Read inputs from `env`, resolving the directory against `cwd`
    pub fn new(env: &'a EnvConfig, cwd: impl Into<PathBuf>) -> Self {
        Self {
            env,
            cwd: cwd.into(),
        }
    }

    fn module_name(&self) -> Result<String, ValidationError> {
        if let Some(name) = actions::input(self.env, "module") {
            return Ok(name);
        }

        let repository = self
            .env
            .get(GITHUB_REPOSITORY_ENV)
            .ok_or(ValidationError::MissingArgument { argument: "module" })?;
        match repository.split_once('/') {
            Some((_, repo)) if !repo.is_empty() => Ok(repo.to_string()),
            _ => Err(ValidationError::InvalidArgument {
                argument: "module",
                reason: format!(
                    "expected organization/repository format for {GITHUB_REPOSITORY_ENV}, got '{repository}'"
                ),
            }),
        }
    }
}

impl ModuleSpecSource for ActionInputs<'_> {
    fn module_spec(&self) -> Result<ModuleSpec, ValidationError> {
        let name = self.module_name()?;
        let system =
            actions::input(self.env, "system").unwrap_or_else(|| DEFAULT_SYSTEM.to_string());
        let version = actions::input(self.env, "version")
            .ok_or(ValidationError::MissingArgument { argument: "version" })?;
        let directory = actions::input(self.env, "directory").unwrap_or_else(|| ".".to_string());
        let namespace = actions::input(self.env, "namespace")
            .ok_or(ValidationError::MissingArgument { argument: "namespace" })?;

        Ok(ModuleSpec {
            namespace,
            name,
            system,
            version,
            directory: resolve_directory(&self.cwd, Some(Path::new(&directory))),
        })
    }
}

/// Absolute form of `directory`, following symlinks when it exists
fn resolve_directory(cwd: &Path, directory: Option<&Path>) -> PathBuf {
    let joined = match directory {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => cwd.join(dir),
        None => cwd.to_path_buf(),
    };
    std::fs::canonicalize(&joined).unwrap_or(joined)
}
