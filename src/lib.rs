//! # rt
//!
//! Publishing client for Registry Tools module registries.
//!
//! `rt` packs an infrastructure module directory, uploads it, and registers a
//! new module version. It authenticates with service credentials, an explicit
//! token, or a token stored by the browser-based `rt login` flow.
//!
//! ## Features
//!
//! - **Credential precedence**: client credentials, then `REGISTRY_TOOLS_TOKEN`, then the stored token
//! - **Device login**: OAuth device authorization with a per-host token store
//! - **Staged publishing**: every failure names the stage it happened in and maps to one exit code
//! - **GitHub Actions**: inputs, outputs and an HTML step summary
//!
//! ## Usage
//!
//! ```bash
//! rt login                                    # log in to registrytools.cloud
//! rt publish --namespace=acme --version=1.0.0 # publish the current directory
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod actions;
pub mod archive;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod host;
pub mod login;
pub mod module;
pub mod net;
pub mod prompt;
pub mod publish;
pub mod registry;
pub mod summary;

pub use cli::{Args, OutputManager};
pub use config::{EnvConfig, TokenStore};
pub use credentials::{AccessToken, CredentialResolver, Identity};
pub use error::{Result, RtError};
pub use host::Hostname;
pub use module::ModuleSpec;
pub use publish::{Mode, PublishOutcome, PublishTransaction, Stage, StageError};
pub use summary::PublishResult;
