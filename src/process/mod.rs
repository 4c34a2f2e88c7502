use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use crate::{config::Config, errors::Result, service::DevService, utils::SPINNER_CHARS};

mod api;
mod audit;
mod commit;
mod docs;
mod regex;
mod scan;
mod timer;

/// Represents the final outcome of a [Process] execution
#[derive(Debug, Default)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct ProcessOutput {
    /// Text to be printed on the standard output
    pub stdout: Option<String>,
    /// Text to be printed on the standard error
    pub stderr: Option<String>,
    /// Whether the process failed
    pub failed: bool,
}

impl ProcessOutput {
    /// Creates a successful output
    pub fn success() -> Self {
        Self::default()
    }

    /// Creates a failed output
    pub fn fail() -> Self {
        Self {
            failed: true,
            ..Default::default()
        }
    }

    /// Sets the standard output text
    pub fn stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = Some(stdout.into());
        self
    }

    /// Sets the standard error text
    pub fn stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = Some(stderr.into());
        self
    }
}

/// Trait for every feature flow, interacting with the user through the terminal
pub trait Process {
    /// Executes the process, prompting for any missing input.
    ///
    /// Errors are reported by the caller, so a failed flow just returns them.
    fn execute(
        self,
        config: Config,
        service: DevService,
        cancellation_token: CancellationToken,
    ) -> impl Future<Output = Result<ProcessOutput>>;
}

/// Displays a spinner with the given message until it's cleared
fn spinner(msg: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {wide_msg}") {
        pb.set_style(style.tick_strings(&SPINNER_CHARS));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(msg);
    pb
}

/// Prints a titled block of text between separators
fn print_block(config: &Config, title: &str, content: &str) {
    println!("\n{}", config.theme.info.apply(format!("--- {title} ---")));
    println!("{content}");
    println!("{}\n", config.theme.secondary.apply(crate::utils::SEPARATOR));
}
