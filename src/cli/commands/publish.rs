//! `rt publish`

use super::CommandContext;
use crate::archive::SlugArchiver;
use crate::config::TokenStore;
use crate::credentials::{CredentialResolver, HttpTokenExchanger};
use crate::error::{CredentialError, EXIT_FAILURE, EXIT_SUCCESS, Result};
use crate::host::Hostname;
use crate::net;
use crate::prompt::ConsoleInput;
use crate::publish::{CliModuleArgs, Mode, ModuleSpecSource, PublishOutcome, PublishTransaction};
use crate::registry::HttpRegistryConnector;

/// Publish interactively from command line flags
pub(super) async fn execute_publish(args: &CliModuleArgs, ctx: &CommandContext) -> Result<i32> {
    match run_transaction(args, Mode::Interactive, ctx).await? {
        PublishOutcome::Published(result) => {
            result.print(&ctx.output);
            Ok(EXIT_SUCCESS)
        }
        PublishOutcome::Declined => {
            ctx.output.error("User did not confirm");
            Ok(EXIT_FAILURE)
        }
    }
}

/// Build the HTTP-backed transaction and run it for `source`
pub(super) async fn run_transaction<S: ModuleSpecSource>(
    source: &S,
    mode: Mode,
    ctx: &CommandContext,
) -> Result<PublishOutcome> {
    let host = Hostname::parse(&ctx.env.hostname()).map_err(|e| {
        CredentialError::ClientConstruction {
            reason: e.to_string(),
        }
    })?;
    let store = load_store(ctx);
    let http_client = net::build_client().map_err(|e| CredentialError::ClientConstruction {
        reason: e.to_string(),
    })?;

    let resolver = CredentialResolver::new(
        &ctx.env,
        &store,
        HttpTokenExchanger::new(http_client.clone()),
    );
    let transaction = PublishTransaction::new(
        resolver,
        HttpRegistryConnector::new(http_client),
        SlugArchiver,
        &ctx.output,
        host,
        mode,
        &ctx.cwd,
        ctx.cancel.clone(),
    );

    let mut input = ConsoleInput;
    transaction.run(source, &mut input).await.map_err(|e| {
        log::debug!("Publish failed at stage '{}': {:?}", e.stage, e.error);
        e.error
    })
}

/// A broken user config only matters when it would have supplied the token
fn load_store(ctx: &CommandContext) -> TokenStore {
    TokenStore::load().unwrap_or_else(|e| {
        ctx.output.warn(&format!("Ignoring user config: {e}"));
        TokenStore::empty(TokenStore::default_path().unwrap_or_default())
    })
}
