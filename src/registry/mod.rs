//! Registry API surface used by `rt publish`.

mod client;
mod error;

pub use client::{HttpRegistryClient, HttpRegistryConnector};
pub use error::ApiError;

use crate::credentials::Identity;
use crate::error::CredentialError;
use crate::host::Hostname;
use crate::module::ModuleSpec;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Module version as recorded by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedVersion {
    /// Registry identifier
    pub id: String,
    /// Namespace the version was published under
    pub namespace: String,
    /// Module name
    pub name: String,
    /// Provider system
    pub system: String,
    /// Version string
    pub version: String,
}

/// Operations the publish transaction needs from a registry
pub trait RegistryClient {
    /// Host this client talks to
    fn endpoint(&self) -> &Hostname;

    /// Upload an archive and return its blob id
    fn upload_archive(
        &self,
        filename: &str,
        size_hint: u64,
        file: tokio::fs::File,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<String, ApiError>>;

    /// Register a module version backed by an uploaded archive
    fn create_module_version(
        &self,
        spec: &ModuleSpec,
        archive_id: &str,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<PublishedVersion, ApiError>>;
}

/// Builds a registry client from a resolved identity
pub trait RegistryConnector {
    /// Client type produced
    type Client: RegistryClient;

    /// Construct a client; failures are credential-class
    fn connect(&self, identity: &Identity) -> Result<Self::Client, CredentialError>;
}
