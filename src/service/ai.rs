use itertools::Itertools;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::DevService;
use crate::{
    ai::AiClient,
    errors::{Result, UserFacingError},
    model::{CompletionRequest, Dependency, DocsKind, HttpResponse},
    utils::truncate_chars,
};

/// Maximum tokens of each feature response
const COMMIT_MAX_TOKENS: u32 = 220;
const DOCS_MAX_TOKENS: u32 = 600;
const REGEX_MAX_TOKENS: u32 = 220;
const API_MAX_TOKENS: u32 = 360;
const AUDIT_MAX_TOKENS: u32 = 500;

impl DevService {
    /// Generates a conventional commit message for the given diff
    #[instrument(skip_all)]
    pub async fn generate_commit_message(&self, diff: &str, cancellation_token: &CancellationToken) -> Result<String> {
        let req = CompletionRequest::new(&self.ai.prompts.commit, commit_prompt(diff), COMMIT_MAX_TOKENS);
        self.complete(req, cancellation_token).await
    }

    /// Generates documentation of the given kind from some content
    #[instrument(skip_all, fields(kind = %kind))]
    pub async fn generate_docs(
        &self,
        kind: DocsKind,
        content: &str,
        cancellation_token: &CancellationToken,
    ) -> Result<String> {
        let req = CompletionRequest::new(&self.ai.prompts.docs, kind.prompt(content), DOCS_MAX_TOKENS);
        self.complete(req, cancellation_token).await
    }

    /// Asks for a regular expression matching the description, returning the raw suggestion
    #[instrument(skip_all)]
    pub async fn suggest_regex(
        &self,
        description: &str,
        examples: &str,
        cancellation_token: &CancellationToken,
    ) -> Result<String> {
        let req = CompletionRequest::new(&self.ai.prompts.regex, regex_prompt(description, examples), REGEX_MAX_TOKENS);
        self.complete(req, cancellation_token).await
    }

    /// Summarizes an HTTP response
    #[instrument(skip_all, fields(status = response.status))]
    pub async fn analyze_response(
        &self,
        response: &HttpResponse,
        cancellation_token: &CancellationToken,
    ) -> Result<String> {
        let req = CompletionRequest::new(&self.ai.prompts.api, api_prompt(response), API_MAX_TOKENS);
        self.complete(req, cancellation_token).await
    }

    /// Reviews the dependencies looking for known risks, the response is free-form text
    #[instrument(skip_all, fields(dependencies = dependencies.len()))]
    pub async fn audit_dependencies(
        &self,
        dependencies: &[Dependency],
        cancellation_token: &CancellationToken,
    ) -> Result<String> {
        let req = CompletionRequest::new(&self.ai.prompts.audit, audit_prompt(dependencies), AUDIT_MAX_TOKENS);
        self.complete(req, cancellation_token).await
    }

    async fn complete(&self, req: CompletionRequest, cancellation_token: &CancellationToken) -> Result<String> {
        let req = req.with_temperature(self.ai.temperature);

        tracing::trace!("System Prompt:\n{}", req.system_prompt);
        tracing::trace!("User Prompt:\n{}", req.user_prompt);

        let client = AiClient::new(&self.ai)?;
        tokio::select! {
            biased;
            _ = cancellation_token.cancelled() => {
                tracing::info!("AI request cancelled");
                Err(UserFacingError::Cancelled.into())
            }
            res = client.complete(&req) => res,
        }
    }
}

fn commit_prompt(diff: &str) -> String {
    format!(
        r#"You are an expert developer following conventional commits.
Given the git diff below, produce:
1) conventional commit title (max 72 chars)
2) 2-3 line body explaining why
3) optional footer

Diff:
```
{diff}
```

Format:
<type>(<scope>): <title>

<body>

<footer>"#
    )
}

fn regex_prompt(description: &str, examples: &str) -> String {
    format!(
        r#"Generate regex for: {description}
Examples: {examples}
Provide:
- Pattern (no slashes)
- Flags (i,m,s or none)
- Brief explanation
- Usage example"#
    )
}

fn api_prompt(response: &HttpResponse) -> String {
    format!(
        "Analyze HTTP response:\nStatus: {}\nBody: ```{}```\nProvide 2-line summary.",
        response.status,
        truncate_chars(&response.body, super::AI_BODY_LIMIT)
    )
}

fn audit_prompt(dependencies: &[Dependency]) -> String {
    format!(
        "Review these dependencies and list the packages with known vulnerabilities or risks, with the affected \
         versions and the recommended upgrade:\n{}",
        dependencies.iter().join("\n")
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_commit_prompt_embeds_diff() {
        let prompt = commit_prompt("+fn main() {}");
        assert!(prompt.contains("```\n+fn main() {}\n```"));
        assert!(prompt.contains("max 72 chars"));
    }

    #[test]
    fn test_api_prompt_truncates_body() {
        let response = HttpResponse {
            status: 200,
            reason: "OK".into(),
            body: "x".repeat(5000),
        };
        let prompt = api_prompt(&response);
        assert!(prompt.starts_with("Analyze HTTP response:\nStatus: 200\n"));
        assert!(prompt.contains(&format!("```{}```", "x".repeat(4000))));
        assert!(!prompt.contains(&"x".repeat(4001)));
    }

    #[test]
    fn test_audit_prompt_lists_dependencies() {
        let deps = vec![
            Dependency::new("lodash", Some("4.17.4")),
            Dependency::new("express", Some("3.0.0")),
        ];
        let prompt = audit_prompt(&deps);
        assert_eq!(prompt.lines().skip(1).collect::<Vec<_>>(), vec!["lodash@4.17.4", "express@3.0.0"]);
    }
}
