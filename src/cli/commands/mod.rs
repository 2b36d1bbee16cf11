//! Command execution and error reporting.

mod gha;
mod login;
mod publish;

use crate::cli::{Command, OutputManager};
use crate::config::EnvConfig;
use crate::error::RtError;
use crate::publish::CliModuleArgs;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Everything a command needs from the process
pub struct CommandContext {
    /// Environment snapshot
    pub env: EnvConfig,
    /// Terminal output
    pub output: OutputManager,
    /// Working directory at startup
    pub cwd: PathBuf,
    /// Fires on Ctrl-C
    pub cancel: CancellationToken,
}

/// Execute `command` and return the process exit code
pub async fn execute_command(command: &Command, ctx: &CommandContext) -> i32 {
    let result = match command {
        Command::Login { hostname } => login::execute_login(hostname.as_deref(), ctx).await,
        Command::Publish {
            namespace,
            version,
            name,
            system,
            directory,
        } => {
            let args = CliModuleArgs {
                namespace: namespace.clone(),
                version: version.clone(),
                name: name.clone(),
                system: system.clone(),
                directory: directory.clone(),
                cwd: ctx.cwd.clone(),
            };
            publish::execute_publish(&args, ctx).await
        }
        Command::Gha => gha::execute_gha(ctx).await,
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(e) => {
            report_error(&ctx.output, command.name(), &e);
            e.exit_code()
        }
    }
}

fn report_error(output: &OutputManager, command: &str, error: &RtError) {
    log::debug!("Command '{command}' failed: {error:?}");
    output.error(&error.to_string());

    let suggestions = error.recovery_suggestions();
    if !suggestions.is_empty() {
        output.println("\n💡 Recovery suggestions:");
        for suggestion in suggestions {
            output.println(&format!("  • {suggestion}"));
        }
    }
}
