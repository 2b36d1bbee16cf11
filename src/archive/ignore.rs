//! `.terraformignore` rules.

use glob::{MatchOptions, Pattern};
use std::path::Path;

/// Ignore file read from the module root
pub const IGNORE_FILE: &str = ".terraformignore";

const DEFAULT_RULES: &[&str] = &[".git/", ".terraform/"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct Rule {
    pattern: Pattern,
    negated: bool,
    directory_only: bool,
}

/// Ordered exclusion rules; the last matching rule wins
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    rules: Vec<Rule>,
}

impl IgnoreRules {
    /// Rules from `root/.terraformignore`, or the defaults when absent
    pub fn load(root: &Path) -> std::io::Result<Self> {
        let path = root.join(IGNORE_FILE);
        if !path.is_file() {
            return Ok(Self::parse(""));
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(Self::parse(&contents))
    }

    /// Parse ignore-file contents on top of the default rules.
    ///
    /// Blank lines and `#` comments are skipped. Unparseable patterns are
    /// logged and dropped.
    pub fn parse(contents: &str) -> Self {
        let lines = DEFAULT_RULES.iter().copied().chain(contents.lines());
        let rules = lines.filter_map(parse_rule).collect();
        Self { rules }
    }

    /// Whether `relative` (a path under the module root) is excluded
    pub fn is_excluded(&self, relative: &Path, is_dir: bool) -> bool {
        let mut excluded = false;
        for rule in &self.rules {
            if rule.directory_only && !is_dir {
                continue;
            }
            if rule.pattern.matches_path_with(relative, MATCH_OPTIONS) {
                excluded = !rule.negated;
            }
        }
        excluded
    }
}

fn parse_rule(line: &str) -> Option<Rule> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (negated, line) = match line.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, line),
    };
    let (directory_only, line) = match line.strip_suffix('/') {
        Some(rest) => (true, rest),
        None => (false, line),
    };

    // Leading "/" anchors to the root, otherwise match at any depth
    let glob = match line.strip_prefix('/') {
        Some(anchored) => anchored.to_string(),
        None if line.starts_with("**") => line.to_string(),
        None => format!("**/{line}"),
    };

    match Pattern::new(&glob) {
        Ok(pattern) => Some(Rule {
            pattern,
            negated,
            directory_only,
        }),
        Err(e) => {
            log::warn!("Ignoring invalid {IGNORE_FILE} pattern '{line}': {e}");
            None
        }
    }
}
