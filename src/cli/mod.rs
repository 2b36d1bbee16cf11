//! Command line interface for `rt`.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command};
pub use commands::{CommandContext, execute_command};
pub use output::{CapturedOutput, OutputManager};

use crate::config::EnvConfig;
use tokio_util::sync::CancellationToken;

/// Main CLI entry point; returns the process exit code
pub async fn run(cancel: CancellationToken) -> i32 {
    let args = Args::parse_args();
    let output = OutputManager::new(false);

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            output.error(&format!("Failed to read current working directory: {e}"));
            return crate::error::EXIT_FAILURE;
        }
    };

    let ctx = CommandContext {
        env: EnvConfig::from_process(),
        output,
        cwd,
        cancel,
    };
    execute_command(&args.command, &ctx).await
}
