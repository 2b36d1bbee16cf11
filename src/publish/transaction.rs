//! The publish pipeline.
//!
//! Stages run strictly in order:
//! validate → resolve credentials → pack → stat → confirm → upload →
//! register → summarize. A failure is reported as a [`StageError`] naming
//! the stage it happened in. Once packed, the temp archive is removed on
//! every exit path.

use super::input::ModuleSpecSource;
use crate::archive::{ArchiveArtifact, Archiver};
use crate::cli::OutputManager;
use crate::credentials::{CredentialResolver, TokenExchanger};
use crate::error::{ArchiveError, RtError, UpstreamError};
use crate::host::Hostname;
use crate::module::ModuleSpec;
use crate::prompt::{InputSource, read_line_or_cancel};
use crate::registry::{ApiError, PublishedVersion, RegistryClient, RegistryConnector};
use crate::summary::{PublishResult, humanize_bytes};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Required fields and version format
    ValidateArgs,
    /// Credential precedence and client construction
    ResolveCredentials,
    /// Archive the module directory
    Pack,
    /// Measure the archive
    Stat,
    /// Interactive confirmation
    Confirm,
    /// Upload the archive
    Upload,
    /// Create the module version
    RegisterVersion,
    /// Build the result
    Summarize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ValidateArgs => "validate arguments",
            Stage::ResolveCredentials => "resolve credentials",
            Stage::Pack => "pack",
            Stage::Stat => "stat archive",
            Stage::Confirm => "confirm",
            Stage::Upload => "upload",
            Stage::RegisterVersion => "register version",
            Stage::Summarize => "summarize",
        };
        f.write_str(name)
    }
}

/// A failure tagged with the stage it occurred in
#[derive(Error, Debug)]
#[error("{error}")]
pub struct StageError {
    /// Stage that failed
    pub stage: Stage,
    /// Classified error
    #[source]
    pub error: RtError,
}

impl StageError {
    fn new(stage: Stage, error: impl Into<RtError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }

    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        self.error.exit_code()
    }
}

/// Whether a human is at the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Ask for confirmation before uploading
    Interactive,
    /// Never prompt
    Automation,
}

/// How a transaction ended without error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Version created
    Published(PublishResult),
    /// User did not confirm; nothing was uploaded
    Declined,
}

/// One `rt publish` or `rt gha` run
pub struct PublishTransaction<'a, X, C, A> {
    resolver: CredentialResolver<'a, X>,
    connector: C,
    archiver: A,
    output: &'a OutputManager,
    host: Hostname,
    mode: Mode,
    cwd: PathBuf,
    cancel: CancellationToken,
}

impl<'a, X, C, A> PublishTransaction<'a, X, C, A>
where
    X: TokenExchanger,
    C: RegistryConnector,
    A: Archiver,
{
    /// Create a transaction publishing to `host`
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        resolver: CredentialResolver<'a, X>,
        connector: C,
        archiver: A,
        output: &'a OutputManager,
        host: Hostname,
        mode: Mode,
        cwd: impl Into<PathBuf>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            resolver,
            connector,
            archiver,
            output,
            host,
            mode,
            cwd: cwd.into(),
            cancel,
        }
    }

    /// Run every stage for the module described by `source`
    pub async fn run<S, I>(&self, source: &S, input: &mut I) -> Result<PublishOutcome, StageError>
    where
        S: ModuleSpecSource,
        I: InputSource,
    {
        let spec = source
            .module_spec()
            .and_then(|spec| spec.validate().map(|()| spec))
            .map_err(|e| StageError::new(Stage::ValidateArgs, e))?;

        let identity = self
            .resolver
            .resolve(&self.host, &self.cancel)
            .await
            .map_err(|e| StageError::new(Stage::ResolveCredentials, e))?;
        let client = self
            .connector
            .connect(&identity)
            .map_err(|e| StageError::new(Stage::ResolveCredentials, e))?;

        let artifact = self
            .archiver
            .pack(&spec.directory)
            .map_err(|e| StageError::new(Stage::Pack, e))?;

        let outcome = self.publish_artifact(&spec, &client, &artifact, input).await;

        if let Err(e) = artifact.cleanup() {
            log::warn!("Failed to remove temporary archive: {e}");
        }
        outcome
    }

    async fn publish_artifact<R, I>(
        &self,
        spec: &ModuleSpec,
        client: &R,
        artifact: &ArchiveArtifact,
        input: &mut I,
    ) -> Result<PublishOutcome, StageError>
    where
        R: RegistryClient,
        I: InputSource,
    {
        let size = artifact
            .compressed_size()
            .map_err(|e| StageError::new(Stage::Stat, e))?;

        if self.mode == Mode::Interactive
            && !self
                .confirm(spec, artifact.uncompressed_size(), size, client.endpoint(), input)
                .await
                .map_err(|e| StageError::new(Stage::Confirm, e))?
        {
            log::debug!("User did not confirm");
            return Ok(PublishOutcome::Declined);
        }

        log::info!(
            "Publishing module \"{}\" version {:?}",
            spec.source(client.endpoint()),
            spec.version
        );

        let blob_id = self
            .upload(spec, client, artifact.path(), size)
            .await
            .map_err(|e| StageError::new(Stage::Upload, e))?;

        let version = client
            .create_module_version(spec, &blob_id, &self.cancel)
            .await
            .map_err(|e| StageError::new(Stage::RegisterVersion, classify_register_error(e)))?;

        Ok(PublishOutcome::Published(self.summarize(
            size,
            client.endpoint(),
            version,
        )))
    }

    async fn upload<R: RegistryClient>(
        &self,
        spec: &ModuleSpec,
        client: &R,
        path: &Path,
        size: u64,
    ) -> Result<String, RtError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|source| ArchiveError::Io {
                operation: "open",
                path: path.to_path_buf(),
                source,
            })?;

        client
            .upload_archive(&spec.archive_name(), size, file, &self.cancel)
            .await
            .map_err(|e| classify_upload_error(e).into())
    }

    async fn confirm<I: InputSource>(
        &self,
        spec: &ModuleSpec,
        uncompressed: u64,
        compressed: u64,
        host: &Hostname,
        input: &mut I,
    ) -> Result<bool, RtError> {
        let directory = if same_directory(&spec.directory, &self.cwd) {
            ".".to_string()
        } else {
            spec.directory.display().to_string()
        };

        self.output.field("Namespace", &spec.namespace);
        self.output.field("Version", &spec.version);
        self.output.field("Name", &spec.name);
        self.output.field("System", &spec.system);
        self.output.field("Directory", &directory);
        self.output.field(
            "Size",
            &format!(
                "{} ({} compressed)",
                humanize_bytes(uncompressed),
                humanize_bytes(compressed)
            ),
        );

        let prompt = format!("Publish to {host}? You must type 'yes' to confirm:");
        match read_line_or_cancel(input, &prompt, &self.cancel).await {
            Ok(Some(answer)) => Ok(answer == "yes"),
            Ok(None) => Err(RtError::Cancelled),
            Err(e) => Err(RtError::Input(e)),
        }
    }

    fn summarize(&self, size: u64, host: &Hostname, version: PublishedVersion) -> PublishResult {
        log::trace!("Published {} ({size} bytes)", version.id);
        PublishResult {
            size,
            host: host.clone(),
            version,
        }
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Upload "not found" almost always means a stale or foreign token
fn classify_upload_error(error: ApiError) -> UpstreamError {
    match error {
        ApiError::Cancelled => UpstreamError::Cancelled,
        e if e.is_not_found() => UpstreamError::Authentication,
        e => UpstreamError::Unclassified(e.to_string()),
    }
}

/// Registration "not found" means the namespace is missing or not writable
fn classify_register_error(error: ApiError) -> UpstreamError {
    match error {
        ApiError::Cancelled => UpstreamError::Cancelled,
        e if e.is_not_found() => UpstreamError::Permission,
        e => UpstreamError::Unclassified(e.to_string()),
    }
}
