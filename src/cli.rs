use std::path::PathBuf;

use clap::{
    Args, Command, CommandFactory, FromArgMatches, Parser, Subcommand,
    builder::{ValueParser, styling::Style},
};
use itertools::Itertools;
use tracing::instrument;

use crate::{
    model::{DocsKind, DocsSource, HttpMethod, parse_size},
    service::parse_header_arg,
};

const CLI_EXAMPLES: &str = r#"Examples:
  # Open the interactive menu
  devcli

  # Generate a commit message for the staged changes of a repo
  devcli commit --repo ../my-project

  # Send a request with a custom header, skipping the AI analysis
  devcli api POST https://httpbin.org/post -H "Accept: application/json" --body '{"a": 1}' --no-analysis

  # List the 10 largest files over 1MB
  devcli scan . --min-size 1MB --limit 10"#;

/// AI-assisted developer conveniences for the terminal
///
/// Run without a command to open the interactive menu. Every tool asks for any missing argument.
#[derive(Parser)]
#[cfg_attr(debug_assertions, derive(Debug))]
#[command(author, version, verbatim_doc_comment, infer_subcommands = true, after_long_help = CLI_EXAMPLES)]
pub struct Cli {
    /// Path of the config file to use
    #[arg(long, global = true, env = "DEVCLI_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Tool to run, the interactive menu is displayed if missing
    #[command(name = "command", subcommand)]
    pub process: Option<CliProcess>,
}

#[derive(Subcommand)]
#[cfg_attr(debug_assertions, derive(Debug))]
pub enum CliProcess {
    /// Generates a conventional commit message from the staged changes
    Commit(CommitProcess),

    /// Generates a README or docs from the package.json, a source file or a description
    Docs(DocsProcess),

    /// Generates a regular expression from a description and tests it against some examples
    Regex(RegexProcess),

    /// Sends an HTTP request and summarizes the response
    Api(ApiProcess),

    /// Lists the largest files on a directory
    Scan(ScanProcess),

    /// Reviews the dependencies of a project looking for known risks
    Audit(AuditProcess),

    /// Tracks the time you're actively using the keyboard or mouse
    Timer(TimerProcess),
}

/// Generates a conventional commit message
#[derive(Args, Debug, Default)]
pub struct CommitProcess {
    /// Path of the git repository (defaults to the working dir)
    #[arg(short, long)]
    pub repo: Option<PathBuf>,
    /// Commit the generated message without asking for confirmation
    #[arg(short, long)]
    pub commit: bool,
    /// Copy the generated message to the clipboard without asking for confirmation
    #[arg(long)]
    pub copy: bool,
}

/// Generates documentation
#[derive(Args, Debug, Default)]
pub struct DocsProcess {
    /// Where to read the content from
    #[arg(short, long, value_enum)]
    pub from: Option<DocsSource>,
    /// Source file to read when generating from a file
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Kind of documentation to generate
    #[arg(short, long, value_enum)]
    pub kind: Option<DocsKind>,
    /// File to save the documentation to, the user is asked if missing
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Generates and tests a regular expression
#[derive(Args, Debug, Default)]
pub struct RegexProcess {
    /// What the regular expression must match
    #[arg(short, long)]
    pub describe: Option<String>,
    /// Example strings, separated by commas or semicolons
    #[arg(short, long)]
    pub examples: Option<String>,
}

/// Sends an HTTP request
#[derive(Args, Debug, Default)]
pub struct ApiProcess {
    /// HTTP method of the request
    #[arg(value_enum, ignore_case = true)]
    pub method: Option<HttpMethod>,
    /// URL of the request
    pub url: Option<String>,
    /// Custom headers to include in the request
    ///
    /// This argument can be specified multiple times to add more than one header
    #[arg(short = 'H', long = "header", value_name = "KEY: VALUE", value_parser = ValueParser::new(parse_header_arg))]
    pub headers: Vec<(String, String)>,
    /// Body of the request, sent as json when valid (only for POST, PUT and PATCH)
    #[arg(short, long)]
    pub body: Option<String>,
    /// Skip the AI analysis of the response
    #[arg(long)]
    pub no_analysis: bool,
}

/// Lists the largest files
#[derive(Args, Debug, Default)]
pub struct ScanProcess {
    /// Directory to scan (defaults to the working dir)
    pub path: Option<PathBuf>,
    /// Minimum size of the files to list, in bytes or with a unit (e.g. 500KB, 5MB, 1GB)
    #[arg(short, long, value_parser = ValueParser::new(parse_size))]
    pub min_size: Option<u64>,
    /// Maximum number of files to list
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Reviews the dependencies of a project
#[derive(Args, Debug, Default)]
pub struct AuditProcess {
    /// Directory containing the package.json or requirements.txt (defaults to the working dir)
    pub path: Option<PathBuf>,
}

/// Tracks active time
#[derive(Args, Debug, Default)]
pub struct TimerProcess {}

impl Cli {
    /// Parses the [Cli] command, styling the examples of the long help
    #[instrument]
    pub fn parse_extended() -> Self {
        let mut cmd = Self::command();

        // Update after_long_help to match the style, if present
        let style = cmd.get_styles().clone();
        let dimmed = style.get_placeholder().dimmed();
        let plain_examples_header = "Examples:";
        let styled_examples_header = format!(
            "{}Examples:{}",
            style.get_usage().render(),
            style.get_usage().render_reset()
        );
        style_after_long_help(&mut cmd, &dimmed, plain_examples_header, &styled_examples_header);

        let matches = cmd.get_matches();
        match Cli::from_arg_matches(&matches) {
            Ok(args) => args,
            Err(err) => err.exit(),
        }
    }
}

fn style_after_long_help(
    command_ref: &mut Command,
    dimmed: &Style,
    plain_examples_header: &str,
    styled_examples_header: &str,
) {
    let mut command = std::mem::take(command_ref);
    if let Some(after_long_help) = command.get_after_long_help() {
        let modified_help_text = after_long_help
            .to_string()
            .replace(plain_examples_header, styled_examples_header)
            // Dim the comment lines
            .lines()
            .map(|line| {
                if line.trim_start().starts_with('#') {
                    format!("{}{}{}", dimmed.render(), line, dimmed.render_reset())
                } else {
                    line.to_string()
                }
            })
            .join("\n");
        command = command.after_long_help(modified_help_text);
    }
    for subcommand_ref in command.get_subcommands_mut() {
        style_after_long_help(subcommand_ref, dimmed, plain_examples_header, styled_examples_header);
    }
    *command_ref = command;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_cli_asserts() {
        Cli::command().debug_assert()
    }

    #[test]
    fn test_parse_no_command() {
        let cli = Cli::try_parse_from(["devcli"]).unwrap();
        assert!(cli.process.is_none());
    }

    #[test]
    fn test_parse_api() {
        let cli = Cli::try_parse_from([
            "devcli",
            "api",
            "post",
            "https://example.com",
            "-H",
            "Accept: application/json",
            "--body",
            "{}",
        ])
        .unwrap();
        let Some(CliProcess::Api(api)) = cli.process else {
            panic!("Expected the api command");
        };
        assert_eq!(api.method, Some(HttpMethod::Post));
        assert_eq!(api.url.as_deref(), Some("https://example.com"));
        assert_eq!(api.headers, vec![("Accept".to_string(), "application/json".to_string())]);
        assert_eq!(api.body.as_deref(), Some("{}"));
        assert!(!api.no_analysis);
    }

    #[test]
    fn test_parse_scan() {
        let cli = Cli::try_parse_from(["devcli", "scan", "/tmp", "--min-size", "1MB", "--limit", "5"]).unwrap();
        let Some(CliProcess::Scan(scan)) = cli.process else {
            panic!("Expected the scan command");
        };
        assert_eq!(scan.path, Some(PathBuf::from("/tmp")));
        assert_eq!(scan.min_size, Some(1024 * 1024));
        assert_eq!(scan.limit, Some(5));
    }

    #[test]
    fn test_parse_commit() {
        let cli = Cli::try_parse_from(["devcli", "commit", "--repo", "/tmp/repo", "--copy"]).unwrap();
        let Some(CliProcess::Commit(commit)) = cli.process else {
            panic!("Expected the commit command");
        };
        assert_eq!(commit.repo, Some(PathBuf::from("/tmp/repo")));
        assert!(commit.copy);
        assert!(!commit.commit);

        let cli = Cli::try_parse_from(["devcli", "commit", "-c"]).unwrap();
        let Some(CliProcess::Commit(commit)) = cli.process else {
            panic!("Expected the commit command");
        };
        assert!(commit.commit);
        assert!(!commit.copy);
    }

    #[test]
    fn test_parse_docs() {
        let cli = Cli::try_parse_from(["devcli", "docs", "--from", "file", "--kind", "functions"]).unwrap();
        let Some(CliProcess::Docs(docs)) = cli.process else {
            panic!("Expected the docs command");
        };
        assert_eq!(docs.from, Some(DocsSource::File));
        assert_eq!(docs.kind, Some(DocsKind::Functions));
    }
}
