//! Line-oriented user input.
//!
//! Confirmation and device-code acknowledgment read through [`InputSource`],
//! so automation runs and tests never touch the real console.

use std::collections::VecDeque;
use std::future::Future;
use std::io::{self, BufRead, Write};
use tokio_util::sync::CancellationToken;

/// Source of user responses
pub trait InputSource {
    /// Show `prompt` and wait until a line is entered.
    ///
    /// The returned line has its trailing newline removed. End of input
    /// yields an empty line.
    fn read_line(&mut self, prompt: &str) -> impl Future<Output = io::Result<String>>;
}

/// Read a line, giving up with `None` once `cancel` fires
pub async fn read_line_or_cancel<I: InputSource>(
    input: &mut I,
    prompt: &str,
    cancel: &CancellationToken,
) -> io::Result<Option<String>> {
    tokio::select! {
        _ = cancel.cancelled() => Ok(None),
        line = input.read_line(prompt) => line.map(Some),
    }
}

/// Reads from stdin, writing prompts to stdout
#[derive(Debug, Default)]
pub struct ConsoleInput;

impl InputSource for ConsoleInput {
    async fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{prompt} ")?;
        stdout.flush()?;
        drop(stdout);

        // Stdin reads block; an abandoned read is left to process exit
        tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line.trim_end_matches(['\r', '\n']).to_string())
        })
        .await
        .map_err(io::Error::other)?
    }
}

/// Pre-recorded responses, for tests and non-interactive callers
#[derive(Debug, Default)]
pub struct ScriptedInput {
    responses: VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedInput {
    /// Respond with `responses` in order, then with empty lines
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    /// Prompts shown so far
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl InputSource for ScriptedInput {
    async fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        self.prompts.push(prompt.to_string());
        Ok(self.responses.pop_front().unwrap_or_default())
    }
}
