//! `rt login`

use super::CommandContext;
use crate::config::TokenStore;
use crate::error::{CredentialError, EXIT_SUCCESS, LoginError, Result};
use crate::host::Hostname;
use crate::login::{HttpDeviceFlowProvider, LoginFlow};
use crate::net;
use crate::prompt::ConsoleInput;

/// Run the device login for `hostname` or the configured host
pub(super) async fn execute_login(hostname: Option<&str>, ctx: &CommandContext) -> Result<i32> {
    let raw = hostname
        .map(str::to_string)
        .unwrap_or_else(|| ctx.env.hostname());
    let host = Hostname::parse(&raw).map_err(|e| LoginError::InvalidHost(e.0))?;

    let mut store = TokenStore::load()?;
    let http_client = net::build_client().map_err(|e| CredentialError::ClientConstruction {
        reason: e.to_string(),
    })?;

    let mut input = ConsoleInput;
    LoginFlow::new(
        HttpDeviceFlowProvider::new(http_client),
        &mut input,
        &ctx.output,
        ctx.cancel.clone(),
    )
    .login(&host, &mut store, env!("CARGO_PKG_VERSION"))
    .await?;

    ctx.output
        .success(&format!("Success! Logged in to {host}"));
    ctx.output
        .indent(&format!("Token saved to {}", store.path().display()));
    Ok(EXIT_SUCCESS)
}
