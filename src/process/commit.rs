use std::env;

use color_eyre::eyre::Context;
use tokio_util::sync::CancellationToken;

use super::{Process, ProcessOutput, print_block, spinner};
use crate::{
    cli::CommitProcess,
    config::Config,
    errors::{Result, UserFacingError},
    format_msg, format_warning,
    service::{DevService, GitRepo},
    utils::Prompter,
};

impl Process for CommitProcess {
    async fn execute(
        self,
        config: Config,
        service: DevService,
        cancellation_token: CancellationToken,
    ) -> Result<ProcessOutput> {
        let prompt = Prompter::new(&config.theme, &cancellation_token);

        // Resolve the repository
        let repo_path = match self.repo {
            Some(repo) => repo,
            None => {
                let cwd = env::current_dir().wrap_err("Couldn't read the working dir")?;
                prompt
                    .text_or("Git repo path", &cwd.to_string_lossy())
                    .await?
                    .into()
            }
        };
        let repo = GitRepo::open(&repo_path)?;

        if !repo.is_initialized() {
            println!(
                "{}",
                format_warning!(config.theme, "No .git folder found at {}", repo.path().display())
            );
            if !prompt.confirm("Initialize git repo?", false).await? {
                return Err(UserFacingError::GitMissingRepo(repo.path().display().to_string()).into());
            }
            repo.init(&cancellation_token).await?;
            println!("{}", format_msg!(config.theme, "Initialized empty repository"));
        }

        // Retrieve the staged changes, or ask for them
        let mut diff = repo.staged_diff(&cancellation_token).await?;
        if diff.is_empty() {
            println!("{}", format_warning!(config.theme, "No staged changes found"));
            if !prompt.confirm("Paste diff manually?", false).await? {
                return Err(UserFacingError::EmptyInput.into());
            }
            diff = prompt.editor("the diff").await?;
            if diff.is_empty() {
                return Err(UserFacingError::EmptyInput.into());
            }
        }

        let pb = spinner("Generating commit message ...");
        let res = service.generate_commit_message(&diff, &cancellation_token).await;
        pb.finish_and_clear();
        let message = res?;

        print_block(&config, "Suggested Commit", &message);

        let commit = self.commit
            || prompt
                .confirm(&format!("Commit in {}?", repo.path().display()), false)
                .await?;
        let copy = self.copy || prompt.confirm("Copy to clipboard?", false).await?;

        if copy {
            match copy_to_clipboard(&message) {
                Ok(()) => println!("{}", format_msg!(config.theme, "Copied")),
                Err(err) => {
                    tracing::warn!("Couldn't copy to the clipboard: {err}");
                    println!("{}", format_warning!(config.theme, "Copy failed"));
                }
            }
        }
        if !commit {
            return Ok(ProcessOutput::success());
        }

        repo.commit(&message, &cancellation_token).await?;
        Ok(ProcessOutput::success().stderr(format_msg!(config.theme, "Committed")))
    }
}

/// Sets the text of the system clipboard
fn copy_to_clipboard(text: &str) -> Result<(), arboard::Error> {
    arboard::Clipboard::new()?.set_text(text)
}
