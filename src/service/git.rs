use std::path::{Path, PathBuf};

use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
    errors::{Result, UserFacingError},
    utils::{CommandOutput, run_command},
};

/// Temporary file holding the commit message, relative to the repo root
const COMMIT_MSG_FILE: &str = ".devcli_tmp";

/// A local git repository, operated through the `git` binary
#[derive(Clone, Debug)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    /// Opens the given directory, which might not be a repository yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path = path
            .canonicalize()
            .ok()
            .filter(|p| p.is_dir())
            .ok_or_else(|| UserFacingError::NotADirectory(path.display().to_string()))?;
        Ok(Self { path })
    }

    /// The canonical path of the repository
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the directory contains a `.git` folder
    pub fn is_initialized(&self) -> bool {
        self.path.join(".git").exists()
    }

    /// Runs `git init` on the directory
    #[instrument(skip_all)]
    pub async fn init(&self, cancellation_token: &CancellationToken) -> Result<()> {
        self.git(&["init"], cancellation_token).await.map(|_| ())
    }

    /// Retrieves the staged changes, with no context lines
    #[instrument(skip_all)]
    pub async fn staged_diff(&self, cancellation_token: &CancellationToken) -> Result<String> {
        let out = self.git(&["diff", "--cached", "--unified=0"], cancellation_token).await?;
        Ok(out.stdout.trim().to_string())
    }

    /// Commits the staged changes with the given message, skipping hooks
    #[instrument(skip_all)]
    pub async fn commit(&self, message: &str, cancellation_token: &CancellationToken) -> Result<()> {
        let msg_file = self.path.join(COMMIT_MSG_FILE);
        fs::write(&msg_file, message)
            .await
            .map_err(|_| UserFacingError::FileNotAccessible("write", msg_file.display().to_string()))?;

        let res = self
            .git(
                &["commit", "--no-verify", "-F", &msg_file.to_string_lossy()],
                cancellation_token,
            )
            .await;

        // The message file is removed regardless of the commit result
        if let Err(err) = fs::remove_file(&msg_file).await {
            tracing::warn!("Couldn't remove {}: {err}", msg_file.display());
        }

        res.map(|_| ())
    }

    async fn git(&self, args: &[&str], cancellation_token: &CancellationToken) -> Result<CommandOutput> {
        let out = run_command("git", args, &self.path, cancellation_token).await;
        if out.cancelled {
            Err(UserFacingError::Cancelled.into())
        } else if !out.success() {
            Err(UserFacingError::GitCommandFailed(out.failure_message()).into())
        } else {
            Ok(out)
        }
    }
}
