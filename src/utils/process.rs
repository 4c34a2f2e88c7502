use std::{path::Path, process::Stdio};

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Exit code reported when the command couldn't be spawned or was interrupted
pub const NO_EXIT_CODE: i32 = -1;

/// Captured result of an external command
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// The exit code, or [NO_EXIT_CODE] if not available
    pub code: i32,
    /// Whether the command was killed due to a user interruption
    pub cancelled: bool,
}

impl CommandOutput {
    /// Whether the command exited successfully
    pub fn success(&self) -> bool {
        self.code == 0 && !self.cancelled
    }

    /// The most relevant output to display on failures
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            stderr.to_string()
        } else if !self.stdout.trim().is_empty() {
            self.stdout.trim().to_string()
        } else {
            format!("exit code {}", self.code)
        }
    }
}

/// Runs a program with the given args on the working directory, capturing its output.
///
/// This function never fails, spawn errors are reported on the `stderr` of the output. The child process is killed
/// if the cancellation token is cancelled before it exits.
pub async fn run_command(
    program: &str,
    args: &[&str],
    working_dir: impl AsRef<Path>,
    cancellation_token: &CancellationToken,
) -> CommandOutput {
    let working_dir = working_dir.as_ref();
    tracing::debug!("Running `{program} {}` on {}", args.join(" "), working_dir.display());

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = tokio::select! {
        // Prioritize cancellation
        biased;
        _ = cancellation_token.cancelled() => {
            tracing::info!("Cancelled, terminating `{program}` process...");
            return CommandOutput {
                code: NO_EXIT_CODE,
                cancelled: true,
                ..Default::default()
            };
        }
        output = cmd.output() => output,
    };

    match output {
        Ok(output) => {
            let out = CommandOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                code: output.status.code().unwrap_or(NO_EXIT_CODE),
                cancelled: false,
            };
            tracing::debug!("`{program}` exited with code {}", out.code);
            out
        }
        Err(err) => {
            tracing::warn!("Couldn't run `{program}`: {err}");
            CommandOutput {
                stderr: format!("Couldn't run `{program}`: {err}"),
                code: NO_EXIT_CODE,
                ..Default::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_command_captures_output() {
        let token = CancellationToken::new();
        let out = run_command("sh", &["-c", "echo out; echo err >&2; exit 3"], ".", &token).await;
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
        assert_eq!(out.code, 3);
        assert!(!out.success());
        assert_eq!(out.failure_message(), "err");
    }

    #[tokio::test]
    async fn test_run_command_missing_program() {
        let token = CancellationToken::new();
        let out = run_command("devcli-missing-program", &[], ".", &token).await;
        assert_eq!(out.code, NO_EXIT_CODE);
        assert!(!out.cancelled);
        assert!(out.stderr.starts_with("Couldn't run `devcli-missing-program`"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_command_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let out = run_command("sleep", &["5"], ".", &token).await;
        assert!(out.cancelled);
        assert!(!out.success());
    }
}
