//! Colored terminal output for publish and login operations
//!
//! Provides consistent, colored CLI output with proper formatting. Writers are
//! injected so tests can capture everything that would reach the terminal.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use termcolor::{Color, ColorChoice, ColorSpec, NoColor, StandardStream, WriteColor};

type SharedWriter = Mutex<Box<dyn WriteColor + Send>>;

/// Output manager for consistent colored terminal output
pub struct OutputManager {
    stdout: SharedWriter,
    stderr: SharedWriter,
    quiet: bool,
}

impl std::fmt::Debug for OutputManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputManager")
            .field("quiet", &self.quiet)
            .finish_non_exhaustive()
    }
}

impl OutputManager {
    /// Create an output manager writing to the process streams
    pub fn new(quiet: bool) -> Self {
        Self {
            stdout: Mutex::new(Box::new(StandardStream::stdout(ColorChoice::Auto))),
            stderr: Mutex::new(Box::new(StandardStream::stderr(ColorChoice::Auto))),
            quiet,
        }
    }

    /// Create an output manager over explicit writers
    pub fn with_writers(
        stdout: Box<dyn WriteColor + Send>,
        stderr: Box<dyn WriteColor + Send>,
    ) -> Self {
        Self {
            stdout: Mutex::new(stdout),
            stderr: Mutex::new(stderr),
            quiet: false,
        }
    }

    /// Create an output manager that records plain text into memory.
    ///
    /// Both streams are captured into the same buffer in write order.
    pub fn captured() -> (Self, CapturedOutput) {
        let captured = CapturedOutput::default();
        let output = Self::with_writers(
            Box::new(NoColor::new(captured.clone())),
            Box::new(NoColor::new(captured.clone())),
        );
        (output, captured)
    }

    /// Print an info message (normal output)
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut out = lock(&self.stdout);
        let _ = out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)));
        let _ = write!(out, "ℹ");
        let _ = out.reset();
        let _ = writeln!(out, " {}", message);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut out = lock(&self.stdout);
        let _ = out.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
        let _ = write!(out, "✓");
        let _ = out.reset();
        let _ = writeln!(out, " {}", message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut out = lock(&self.stdout);
        let _ = out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
        let _ = write!(out, "⚠");
        let _ = out.reset();
        let _ = out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)));
        let _ = writeln!(out, " {}", message);
        let _ = out.reset();
    }

    /// Print an error message (always shown)
    pub fn error(&self, message: &str) {
        let mut err = lock(&self.stderr);
        if err
            .set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))
            .is_err()
            || write!(err, "✗").is_err()
            || err.reset().is_err()
            || err.set_color(ColorSpec::new().set_fg(Some(Color::Red))).is_err()
            || writeln!(err, " {}", message).is_err()
            || err.reset().is_err()
        {
            // Stderr failed - fallback to stdout as last resort
            drop(err);
            let mut out = lock(&self.stdout);
            let _ = writeln!(out, "[STDERR ERROR] ✗ {}", message);
        }
    }

    /// Print a `label value` line with the value emphasized
    pub fn field(&self, label: &str, value: &str) {
        if self.quiet {
            return;
        }
        let mut out = lock(&self.stdout);
        let _ = out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_dimmed(true));
        let _ = write!(out, "{:<11}", format!("{label}:"));
        let _ = out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
        let _ = write!(out, "{}", value);
        let _ = out.reset();
        let _ = writeln!(out);
    }

    /// Print a highlighted value on its own line, such as a one-time code
    pub fn highlight(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut out = lock(&self.stdout);
        let _ = out.set_color(
            ColorSpec::new()
                .set_fg(Some(Color::Yellow))
                .set_intense(true)
                .set_bold(true),
        );
        let _ = write!(out, "{}", message);
        let _ = out.reset();
        let _ = writeln!(out);
    }

    /// Print indented text (for sub-items)
    pub fn indent(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut out = lock(&self.stdout);
        for line in message.lines() {
            let _ = writeln!(out, "  {}", line);
        }
    }

    /// Print a plain message (respects quiet mode)
    pub fn println(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut out = lock(&self.stdout);
        let _ = writeln!(out, "{}", message);
    }

    /// Print text without a trailing newline
    pub fn print(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut out = lock(&self.stdout);
        let _ = write!(out, "{}", message);
        let _ = out.flush();
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

fn lock(writer: &SharedWriter) -> MutexGuard<'_, Box<dyn WriteColor + Send>> {
    writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory sink shared with an [`OutputManager`] built by `captured()`
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedOutput {
    /// Everything written so far
    pub fn contents(&self) -> String {
        let buffer = self
            .buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captured_output_strips_color() {
        let (output, captured) = OutputManager::captured();
        output.success("Module published successfully.");
        output.error("boom");
        output.field("Version", "1.0.0");

        let text = captured.contents();
        assert!(text.contains("✓ Module published successfully."));
        assert!(text.contains("✗ boom"));
        assert!(text.contains("Version:   1.0.0"));
        assert!(!text.contains('\u{1b}'));
    }
}
