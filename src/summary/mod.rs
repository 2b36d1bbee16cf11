//! Post-publish summaries for the terminal and for GitHub step summaries.

use crate::cli::OutputManager;
use crate::error::SummaryError;
use crate::host::Hostname;
use crate::registry::PublishedVersion;
use handlebars::Handlebars;
use serde::Serialize;

/// Archives above this many bytes trigger a size warning
pub const LARGE_ARCHIVE_BYTES: u64 = 1_000_000;

const HTML_TEMPLATE: &str = include_str!("summary.html.hbs");

const SIZE_ADVICE: &str = "This seems to be extraordinarily large for an IaC module. \
Use a .terraformignore file to exclude files that aren't needed by the module.";

/// Format a byte count with decimal units, truncating
pub fn humanize_bytes(bytes: u64) -> String {
    if bytes > 1_000_000_000 {
        format!("{} GB", bytes / 1_000_000_000)
    } else if bytes > 1_000_000 {
        format!("{} MB", bytes / 1_000_000)
    } else if bytes > 1_000 {
        format!("{} kB", bytes / 1_000)
    } else {
        format!("{bytes} B")
    }
}

/// Outcome of a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    /// Compressed archive size in bytes
    pub size: u64,
    /// Registry host
    pub host: Hostname,
    /// Version recorded by the registry
    pub version: PublishedVersion,
}

#[derive(Serialize)]
struct TemplateData {
    size_human: String,
    oversized: bool,
    usage_example: String,
    tf_token_example: String,
    provision_url: String,
}

impl PublishResult {
    /// Registry source address of the published module
    pub fn source(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.host, self.version.namespace, self.version.name, self.version.system
        )
    }

    /// Terraform snippet consuming the published module
    pub fn usage_example(&self) -> String {
        format!(
            "module \"{}\" {{\n  source = \"{}\"\n  version = \"{}\"\n}}\n",
            self.version.name,
            self.source(),
            self.version.version
        )
    }

    /// Whether the archive is large enough to warn about
    pub fn is_oversized(&self) -> bool {
        self.size > LARGE_ARCHIVE_BYTES
    }

    /// Print the summary through `output`
    pub fn print(&self, output: &OutputManager) {
        output.success("Module published successfully.");
        output.println("");
        output.println("Example Usage:");
        output.println("");
        output.indent(&self.usage_example());
        if let Some(warning) = self.size_warning() {
            output.println("");
            output.warn(&warning);
        }
    }

    /// HTML summary for `$GITHUB_STEP_SUMMARY`
    pub fn html(&self) -> Result<String, SummaryError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(escape_html);
        handlebars.register_template_string("summary", HTML_TEMPLATE)?;
        Ok(handlebars.render("summary", &self.template_data())?)
    }

    fn size_warning(&self) -> Option<String> {
        self.is_oversized().then(|| {
            format!(
                "The size of this module, gzipped, was {}. {SIZE_ADVICE}",
                humanize_bytes(self.size)
            )
        })
    }

    fn template_data(&self) -> TemplateData {
        TemplateData {
            size_human: humanize_bytes(self.size),
            oversized: self.is_oversized(),
            usage_example: self.usage_example(),
            tf_token_example: format!("{}=<token>", self.host.terraform_token_env()),
            provision_url: self.host.provision_url(),
        }
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(size: u64) -> PublishResult {
        PublishResult {
            size,
            host: Hostname::parse("registrytools.cloud").unwrap(),
            version: PublishedVersion {
                id: "mv-1".into(),
                namespace: "spacepioneer".into(),
                name: "computer".into(),
                system: "aws".into(),
                version: "1.0.0".into(),
            },
        }
    }

    #[test]
    fn test_humanize_bytes() {
        let cases = [
            (1024, "1 kB"),
            (884, "884 B"),
            (9999, "9 kB"),
            (7_145_859, "7 MB"),
            (91_957_860, "91 MB"),
            (188_596_999, "188 MB"),
            (9_992_010_501, "9 GB"),
            (1_000, "1000 B"),
        ];
        for (size, expected) in cases {
            assert_eq!(humanize_bytes(size), expected, "size {size}");
        }
    }

    #[test]
    fn test_usage_example() {
        assert_eq!(
            result(1024).usage_example(),
            "module \"computer\" {\n  source = \"registrytools.cloud/spacepioneer/computer/aws\"\n  version = \"1.0.0\"\n}\n"
        );
    }

    #[test]
    fn test_html_summary() {
        let html = result(1024).html().unwrap();
        assert!(html.contains("<h3>Module Published</h3>"));
        assert!(html.contains(
            "<pre>module &#34;computer&#34; {\n  source = &#34;registrytools.cloud/spacepioneer/computer/aws&#34;\n"
        ));
        assert!(html.contains(r#"href="https://registrytools.cloud/provision""#));
        assert!(html.contains("<code>TF_TOKEN_registrytools_cloud=&lt;token&gt;</code>"));
        assert!(html.contains("gzipped, was 1 kB</p>"));
        assert!(!html.contains("extraordinarily large"));
    }

    #[test]
    fn test_large_archive_warnings() {
        let large = result(2_500_000);
        assert!(large.html().unwrap().contains("extraordinarily large"));
        assert!(!result(1_000_000).is_oversized());

        let (output, captured) = OutputManager::captured();
        large.print(&output);
        assert!(captured.contents().contains("gzipped, was 2 MB."));

        let (output, captured) = OutputManager::captured();
        result(1_000_000).print(&output);
        assert!(!captured.contents().contains("gzipped, was"));
    }

    #[test]
    fn test_print_uses_output_channels() {
        let (output, captured) = OutputManager::captured();
        result(1024).print(&output);
        let text = captured.contents();
        assert!(text.contains("✓ Module published successfully."));
        assert!(text.contains("    source = \"registrytools.cloud/spacepioneer/computer/aws\""));
    }
}
