use std::{
    env,
    panic::{self, UnwindSafe},
    path::PathBuf,
    process,
};

use color_eyre::{Report, Section, config::HookBuilder, owo_colors::style};
use futures_util::FutureExt;
use tokio::sync::mpsc;

/// A specialized [`Result`](std::result::Result) for application operations
pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// Initializes error and panics handling
pub async fn init<F>(log_path: Option<PathBuf>, fut: F) -> color_eyre::Result<()>
where
    F: Future<Output = color_eyre::Result<()>> + UnwindSafe,
{
    tracing::trace!("Initializing error handlers");
    // Initialize hooks
    let panic_section = if let Some(log_path) = log_path {
        format!(
            "This is a bug. Consider reporting it at {}\nLogs can be found at {}",
            env!("CARGO_PKG_REPOSITORY"),
            log_path.display()
        )
    } else {
        format!(
            "This is a bug. Consider reporting it at {}\nLogs were not generated, consider enabling them on the \
             config or running with DEVCLI_LOG=debug.",
            env!("CARGO_PKG_REPOSITORY")
        )
    };
    let (panic_hook, eyre_hook) = HookBuilder::default()
        .panic_section(panic_section.clone())
        .display_env_section(false)
        .display_location_section(true)
        .capture_span_trace_by_default(true)
        .into_hooks();

    // Initialize panic notifier
    let (panic_tx, mut panic_rx) = mpsc::channel(1);

    // Install both hooks
    eyre_hook.install()?;
    panic::set_hook(Box::new(move |panic_info| {
        // The terminal might be in raw mode while the activity timer runs, so the report is printed afterwards
        let panic_report = panic_hook.panic_report(panic_info).to_string();
        tracing::error!("Error: {}", strip_ansi_escapes::strip_str(&panic_report));
        if panic_tx.try_send(panic_report).is_err() {
            tracing::error!("Error sending panic report");
            process::exit(2);
        }
    }));

    tokio::select! {
        biased;
        // Wait for a panic to be notified
        panic_report = panic_rx.recv().fuse() => {
            let _ = crossterm::terminal::disable_raw_mode();
            if let Some(report) = panic_report {
                eprintln!("{report}");
            } else {
                eprintln!(
                    "{}\n\n{panic_section}",
                    style().bright_red().style("A panic occurred, but the detailed report could not be captured.")
                );
                tracing::error!("A panic occurred, but the detailed report could not be captured.");
            }
            process::exit(1);
        }
        // Or for the main future to finish, catching unwinding panics
        res = Box::pin(fut).catch_unwind() => {
            match res {
                Ok(r) => r
                    .with_section(move || panic_section)
                    .inspect_err(|err| tracing::error!("Error: {}", strip_ansi_escapes::strip_str(format!("{err:?}")))),
                Err(err) => {
                    let _ = crossterm::terminal::disable_raw_mode();
                    if let Ok(report) = panic_rx.try_recv() {
                        eprintln!("{report}");
                    } else if let Some(err) = err.downcast_ref::<&str>() {
                        print_panic_msg(err, panic_section);
                    } else if let Some(err) = err.downcast_ref::<String>() {
                        print_panic_msg(err, panic_section);
                    } else {
                        eprintln!(
                            "{}\n\n{panic_section}",
                            style().bright_red().style("An unexpected panic happened")
                        );
                        tracing::error!("An unexpected panic happened");
                    }
                    process::exit(1);
                }
            }
        }
    }
}

fn print_panic_msg(err: impl AsRef<str>, panic_section: String) {
    let err = err.as_ref();
    eprintln!(
        "{}\nMessage: {}\n\n{panic_section}",
        style().bright_red().style("The application panicked (crashed)."),
        style().blue().style(err)
    );
    tracing::error!("Panic: {err}");
}

/// Top-level error for every feature flow
#[derive(Debug)]
pub enum AppError {
    /// An error that can be displayed to the user as-is
    UserFacing(UserFacingError),
    /// An unexpected error, that should be logged
    Unexpected(Report),
}

/// Errors with a known, human-readable message
#[derive(Debug, PartialEq, Eq, strum::Display)]
pub enum UserFacingError {
    /// The user cancelled the operation
    #[strum(to_string = "Operation cancelled by user")]
    Cancelled,
    /// A required input was left empty
    #[strum(to_string = "No input. Aborting.")]
    EmptyInput,
    /// The API key environment variable is missing
    #[strum(to_string = "{0} not found. Put it in .env")]
    AiMissingApiKey(String),
    /// The API rejected the configured key
    #[strum(to_string = "AI request failed: missing or invalid api key on {0}")]
    AiInvalidApiKey(String),
    /// The API is rate limiting requests
    #[strum(to_string = "AI request failed: rate limit exceeded, try again later")]
    AiRateLimit,
    /// The API is temporarily unavailable
    #[strum(to_string = "AI request failed: service unavailable, try again later")]
    AiUnavailable,
    /// The AI request took too long
    #[strum(to_string = "AI request failed: request timed out")]
    AiRequestTimeout,
    /// Any other failure of the AI request
    #[strum(to_string = "AI request failed: {0}")]
    AiRequestFailed(String),
    /// The path is not inside a git repository
    #[strum(to_string = "No Git repository found at {0}")]
    GitMissingRepo(String),
    /// A git command returned a non-zero exit code
    #[strum(to_string = "Failed: {0}")]
    GitCommandFailed(String),
    /// The HTTP url couldn't be parsed
    #[strum(to_string = "Invalid URL: {0}")]
    HttpInvalidUrl(String),
    /// A header name or value is not valid
    #[strum(to_string = "Invalid header: {0}")]
    HttpInvalidHeader(String),
    /// The HTTP request timed out
    #[strum(to_string = "Request timed out after {0} seconds")]
    HttpTimeout(u64),
    /// The HTTP request couldn't be completed
    #[strum(to_string = "Request failed: {0}")]
    HttpRequestFailed(String),
    /// The path to scan doesn't exist or is not a directory
    #[strum(to_string = "Not a directory: {0}")]
    NotADirectory(String),
    /// The file can't be read or written
    #[strum(to_string = "Couldn't {0} file: {1}")]
    FileNotAccessible(&'static str, String),
}

impl AppError {
    /// Converts this error into a [Report]
    pub fn into_report(self) -> Report {
        match self {
            AppError::UserFacing(err) => Report::msg(err),
            AppError::Unexpected(report) => report,
        }
    }
}

impl From<UserFacingError> for AppError {
    fn from(err: UserFacingError) -> Self {
        Self::UserFacing(err)
    }
}

impl<T> From<T> for AppError
where
    T: Into<Report>,
{
    fn from(err: T) -> Self {
        Self::Unexpected(err.into())
    }
}

/// Similar to the `std::dbg!` macro, but generates `tracing` events rather
/// than printing to stdout.
///
/// By default, the verbosity level for the generated events is `DEBUG`, but
/// this can be customized.
#[macro_export]
macro_rules! trace_dbg {
    (target: $target:expr, level: $level:expr, $ex:expr) => {
        {
            match $ex {
                value => {
                    tracing::event!(target: $target, $level, ?value, stringify!($ex));
                    value
                }
            }
        }
    };
    (level: $level:expr, $ex:expr) => {
        trace_dbg!(target: module_path!(), level: $level, $ex)
    };
    (target: $target:expr, $ex:expr) => {
        trace_dbg!(target: $target, level: tracing::Level::DEBUG, $ex)
    };
    ($ex:expr) => {
        trace_dbg!(level: tracing::Level::DEBUG, $ex)
    };
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            UserFacingError::AiRequestFailed("boom".into()).to_string(),
            "AI request failed: boom"
        );
        assert_eq!(
            UserFacingError::AiMissingApiKey("OPENAI_API_KEY".into()).to_string(),
            "OPENAI_API_KEY not found. Put it in .env"
        );
        assert_eq!(
            UserFacingError::FileNotAccessible("write", "README.md".into()).to_string(),
            "Couldn't write file: README.md"
        );
    }

    #[test]
    fn test_report_conversion() {
        let err: AppError = color_eyre::eyre::eyre!("unexpected").into();
        assert!(matches!(err, AppError::Unexpected(_)));
        let err: AppError = UserFacingError::Cancelled.into();
        assert_eq!(err.into_report().to_string(), "Operation cancelled by user");
    }
}
