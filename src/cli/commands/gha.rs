//! `rt gha`, the GitHub Actions entrypoint.

use super::CommandContext;
use super::publish::run_transaction;
use crate::actions;
use crate::error::{EXIT_FAILURE, EXIT_SUCCESS, Result, RtError};
use crate::publish::{ActionInputs, Mode, PublishOutcome};

/// Publish from action inputs and report outputs to the runner
pub(super) async fn execute_gha(ctx: &CommandContext) -> Result<i32> {
    if !actions::is_actions(&ctx.env) {
        return Err(RtError::Actions(
            "This command can only be run as a GitHub Action".to_string(),
        ));
    }

    let inputs = ActionInputs::new(&ctx.env, &ctx.cwd);
    let result = match run_transaction(&inputs, Mode::Automation, ctx).await? {
        PublishOutcome::Published(result) => result,
        PublishOutcome::Declined => return Ok(EXIT_FAILURE),
    };

    result.print(&ctx.output);

    if let Err(e) = actions::set_output(&ctx.env, "source", &result.source()) {
        ctx.output.warn(&format!("Failed to set the 'source' output: {e}"));
    }

    match result.html() {
        Ok(html) => {
            if let Err(e) = actions::add_step_summary(&ctx.env, &html) {
                ctx.output.warn(&format!("Failed to write the step summary: {e}"));
            }
        }
        Err(e) => log::error!(
            "Module was published successfully, but this program failed to generate a summary: {e}"
        ),
    }

    Ok(EXIT_SUCCESS)
}
