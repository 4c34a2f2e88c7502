use tokio_util::sync::CancellationToken;

use super::{Process, ProcessOutput, print_block, spinner};
use crate::{
    cli::RegexProcess,
    config::Config,
    errors::Result,
    format_error,
    model::{ExtractedPattern, build_sample_text},
    service::DevService,
    utils::Prompter,
};

impl Process for RegexProcess {
    async fn execute(
        self,
        config: Config,
        service: DevService,
        cancellation_token: CancellationToken,
    ) -> Result<ProcessOutput> {
        let prompt = Prompter::new(&config.theme, &cancellation_token);

        let description = match self.describe {
            Some(description) => description,
            None => prompt.required("Describe regex need").await?,
        };
        let examples = match self.examples {
            Some(examples) => examples,
            None => prompt.text("Example strings (comma/semicolon separated)").await?,
        };

        let pb = spinner("Creating regex ...");
        let res = service
            .suggest_regex(&description, &examples, &cancellation_token)
            .await;
        pb.finish_and_clear();
        let suggestion = res?;

        print_block(&config, "AI Suggestion", &suggestion);

        let pattern = ExtractedPattern::extract(&suggestion);
        tracing::info!("Extracted pattern {pattern} from {:?}", pattern.source);
        println!("Pattern: {}", config.theme.accent.apply(&pattern.raw));
        if !pattern.flags.is_empty() {
            println!("Flags: {}", config.theme.accent.apply(pattern.flags));
        }

        if !prompt.confirm("Test with examples?", true).await? {
            return Ok(ProcessOutput::success());
        }

        let sample = build_sample_text(&examples);
        let result = pattern.test(&sample);
        if result.is_ok() {
            Ok(ProcessOutput::success().stdout(format!("{}\n{result}", config.theme.info.apply("Matches:"))))
        } else {
            Ok(ProcessOutput::fail().stderr(format_error!(config.theme, "{result}")))
        }
    }
}
