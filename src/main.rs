//! rt - publish infrastructure modules to a Registry Tools registry.

use registry_tools_cli::cli;
use registry_tools_cli::config::LOG_LEVEL_ENV;
use registry_tools_cli::error::EXIT_FAILURE;
use std::process;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Time allowed for in-flight work to unwind after Ctrl-C
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_LEVEL_ENV, "warn")).init();

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::debug!("Interrupted, cancelling");
            signal_cancel.cancel();
            // Backstop in case unwinding stalls
            tokio::time::sleep(SHUTDOWN_GRACE).await;
            process::exit(EXIT_FAILURE);
        }
    });

    let exit_code = cli::run(cancel).await;
    process::exit(exit_code);
}
