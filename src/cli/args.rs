//! Command line argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Publish infrastructure modules to a Registry Tools registry
#[derive(Parser, Debug)]
#[command(
    name = "rt",
    version,
    about = "Publish infrastructure modules to a Registry Tools registry",
    long_about = "Publish infrastructure modules to a Registry Tools registry.

Credentials are taken from, in order:
  REGISTRY_TOOLS_CLIENT_ID and REGISTRY_TOOLS_CLIENT_SECRET
  REGISTRY_TOOLS_TOKEN
  a token stored by `rt login`"
)]
pub struct Args {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Log in to a registry in the web browser and store the token
    Login {
        /// Registry hostname (defaults to REGISTRY_TOOLS_HOSTNAME or registrytools.cloud)
        #[arg(value_name = "HOSTNAME")]
        hostname: Option<String>,
    },

    /// Publish a module to the registry
    Publish {
        /// (Required) Namespace of the module, the first part of its path. Ex: "platform"
        #[arg(long)]
        namespace: Option<String>,

        /// (Required) Version of the module. Ex: "2.1.0"
        #[arg(long)]
        version: Option<String>,

        /// Module name. Defaults to being derived from the source directory. Ex: "networking"
        #[arg(long)]
        name: Option<String>,

        /// Provider system. Defaults to being derived from the source directory. Ex: "aws"
        #[arg(long)]
        system: Option<String>,

        /// Directory containing the module source. Defaults to the current directory
        #[arg(long, value_name = "DIR")]
        directory: Option<PathBuf>,
    },

    /// Publish from GitHub Actions inputs
    #[command(hide = true)]
    Gha,
}

impl Command {
    /// Subcommand name for messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Login { .. } => "login",
            Command::Publish { .. } => "publish",
            Command::Gha => "gha",
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
