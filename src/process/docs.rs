use std::path::PathBuf;

use strum::IntoEnumIterator;
use tokio::fs;
use tokio_util::sync::CancellationToken;

use super::{Process, ProcessOutput, print_block, spinner};
use crate::{
    cli::DocsProcess,
    config::Config,
    errors::{Result, UserFacingError},
    format_msg, format_warning,
    model::{DocsKind, DocsSource},
    service::DevService,
    utils::Prompter,
};

/// Source file used when none is provided
const DEFAULT_SOURCE_FILE: &str = "index.js";

impl Process for DocsProcess {
    async fn execute(
        self,
        config: Config,
        service: DevService,
        cancellation_token: CancellationToken,
    ) -> Result<ProcessOutput> {
        let prompt = Prompter::new(&config.theme, &cancellation_token);

        let source = match self.from {
            Some(source) => source,
            None => prompt.select("Generate from", &DocsSource::iter().collect::<Vec<_>>()).await?,
        };

        // Read the content, falling back to the editor when the file is missing
        let path = match source {
            DocsSource::PackageJson => Some(PathBuf::from("package.json")),
            DocsSource::File => Some(match self.file {
                Some(file) => file,
                None => prompt.text_or("File path", DEFAULT_SOURCE_FILE).await?.into(),
            }),
            DocsSource::Manual => None,
        };
        let content = match path {
            Some(path) if path.is_file() => fs::read_to_string(&path)
                .await
                .map_err(|_| UserFacingError::FileNotAccessible("read", path.display().to_string()))?,
            Some(path) => {
                println!("{}", format_warning!(config.theme, "File not found: {}", path.display()));
                prompt.editor("the content").await?
            }
            None => prompt.editor("the description").await?,
        };
        if content.trim().is_empty() {
            return Err(UserFacingError::EmptyInput.into());
        }

        let kind = match self.kind {
            Some(kind) => kind,
            None => prompt.select("Generate what", &DocsKind::iter().collect::<Vec<_>>()).await?,
        };

        let pb = spinner("Generating docs ...");
        let res = service.generate_docs(kind, &content, &cancellation_token).await;
        pb.finish_and_clear();
        let docs = res?;

        print_block(&config, "Generated Docs", &docs);

        // Save the docs
        let output = match self.output {
            Some(output) => output,
            None => {
                if !prompt.confirm("Save to file?", true).await? {
                    return Ok(ProcessOutput::success());
                }
                match kind {
                    DocsKind::Readme => PathBuf::from(kind.default_file_name()),
                    _ => prompt.text_or("Filename", kind.default_file_name()).await?.into(),
                }
            }
        };
        fs::write(&output, &docs)
            .await
            .map_err(|_| UserFacingError::FileNotAccessible("write", output.display().to_string()))?;
        tracing::info!("Docs saved to {}", output.display());

        Ok(ProcessOutput::success().stderr(format_msg!(config.theme, "Saved to {}", output.display())))
    }
}
