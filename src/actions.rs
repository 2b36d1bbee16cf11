//! GitHub Actions runner integration: inputs, outputs and step summaries.

use crate::config::EnvConfig;
use crate::error::{Result, RtError};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Set to `true` by the Actions runner
pub const GITHUB_ACTIONS_ENV: &str = "GITHUB_ACTIONS";
/// `owner/repo` of the workflow repository
pub const GITHUB_REPOSITORY_ENV: &str = "GITHUB_REPOSITORY";
/// File collecting step outputs
pub const GITHUB_OUTPUT_ENV: &str = "GITHUB_OUTPUT";
/// File collecting the Markdown/HTML job summary
pub const GITHUB_STEP_SUMMARY_ENV: &str = "GITHUB_STEP_SUMMARY";

/// Whether the process runs inside a GitHub Actions job
pub fn is_actions(env: &EnvConfig) -> bool {
    env.is(GITHUB_ACTIONS_ENV, "true")
}

/// Action input `name`, read from `INPUT_<NAME>` and trimmed
pub fn input(env: &EnvConfig, name: &str) -> Option<String> {
    let key = format!("INPUT_{}", name.replace(' ', "_").to_uppercase());
    env.get(&key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Append a step output using the multiline delimiter format
pub fn set_output(env: &EnvConfig, name: &str, value: &str) -> Result<()> {
    let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
    append(
        env,
        GITHUB_OUTPUT_ENV,
        &format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"),
    )
}

/// Append `content` to the job summary
pub fn add_step_summary(env: &EnvConfig, content: &str) -> Result<()> {
    append(env, GITHUB_STEP_SUMMARY_ENV, &format!("{content}\n"))
}

fn append(env: &EnvConfig, file_env: &str, content: &str) -> Result<()> {
    let path = env
        .get(file_env)
        .map(PathBuf::from)
        .ok_or_else(|| RtError::Actions(format!("{file_env} is not set")))?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| RtError::Actions(format!("Cannot open {}: {e}", path.display())))?;
    file.write_all(content.as_bytes())
        .map_err(|e| RtError::Actions(format!("Cannot write {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_input_lookup() {
        let env = EnvConfig::from_pairs([
            ("INPUT_NAMESPACE", "  acme \n"),
            ("INPUT_MY_INPUT", "x"),
            ("INPUT_EMPTY", "   "),
        ]);
        assert_eq!(input(&env, "namespace").as_deref(), Some("acme"));
        assert_eq!(input(&env, "my input").as_deref(), Some("x"));
        assert_eq!(input(&env, "empty"), None);
        assert_eq!(input(&env, "missing"), None);
    }

    #[test]
    fn test_is_actions() {
        assert!(is_actions(&EnvConfig::from_pairs([(GITHUB_ACTIONS_ENV, "true")])));
        assert!(!is_actions(&EnvConfig::from_pairs([(GITHUB_ACTIONS_ENV, "1")])));
        assert!(!is_actions(&EnvConfig::default()));
    }

    #[test]
    fn test_set_output_and_summary() {
        let dir = TempDir::new().unwrap();
        let output_path = dir.path().join("output");
        let summary_path = dir.path().join("summary");
        let env = EnvConfig::from_pairs([
            (GITHUB_OUTPUT_ENV, output_path.to_string_lossy().into_owned()),
            (GITHUB_STEP_SUMMARY_ENV, summary_path.to_string_lossy().into_owned()),
        ]);

        set_output(&env, "source", "example.com/acme/net/aws").unwrap();
        add_step_summary(&env, "<h3>Module Published</h3>").unwrap();

        let written = std::fs::read_to_string(&output_path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 3);
        let delimiter = lines[0].strip_prefix("source<<").unwrap();
        assert_eq!(lines[1], "example.com/acme/net/aws");
        assert_eq!(lines[2], delimiter);
        assert_eq!(
            std::fs::read_to_string(&summary_path).unwrap(),
            "<h3>Module Published</h3>\n"
        );
    }

    #[test]
    fn test_set_output_requires_file() {
        let err = set_output(&EnvConfig::default(), "source", "x").unwrap_err();
        assert!(matches!(err, RtError::Actions(_)));
    }
}
