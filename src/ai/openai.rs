use color_eyre::eyre::Context;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Value as Json, json};

use crate::{
    config::AiConfig,
    errors::{Result, UserFacingError},
    model::CompletionRequest,
};

/// Builds the chat completions request, without authentication
pub(super) fn build_request(client: &Client, config: &AiConfig, request: &CompletionRequest) -> RequestBuilder {
    // https://platform.openai.com/docs/api-reference/chat/create
    let request_body = request_body(&config.model, request);

    tracing::trace!("Request:\n{request_body:#}");

    let url = format!("{}/chat/completions", config.url.trim_end_matches('/'));
    client.post(url).json(&request_body)
}

fn request_body(model: &str, request: &CompletionRequest) -> Json {
    json!({
        "model": model,
        "messages": [
            {
                "role": "system",
                "content": request.system_prompt
            },
            {
                "role": "user",
                "content": request.user_prompt
            }
        ],
        "max_tokens": request.max_tokens,
        "temperature": request.temperature
    })
}

/// Extracts the trimmed content of the first choice
pub(super) async fn parse_response(res: Response) -> Result<String> {
    let res: Json = res
        .json()
        .await
        .wrap_err("Completions response not a json")
        .map_err(|err| {
            tracing::error!("{err:?}");
            UserFacingError::AiRequestFailed(String::from("response is not a valid json"))
        })?;
    tracing::trace!("Response:\n{res:#}");
    extract_content(res)
}

fn extract_content(res: Json) -> Result<String> {
    let mut res: CompletionResponse = serde_json::from_value(res).map_err(|err| {
        tracing::error!("Couldn't parse completions response: {err}");
        UserFacingError::AiRequestFailed(String::from("couldn't parse api response"))
    })?;

    if res.choices.is_empty() {
        tracing::error!("Response got no choices: {res:?}");
        return Err(UserFacingError::AiRequestFailed(String::from("received response with no choices")).into());
    } else if res.choices.len() > 1 {
        tracing::warn!("Response got {} choices", res.choices.len());
    }

    let choice = res.choices.remove(0);
    if let Some(reason) = choice.finish_reason.as_deref()
        && reason != "stop"
    {
        // Truncated outputs are still useful for every feature
        tracing::warn!("Response got finish reason: {reason}");
    }

    if let Some(refusal) = choice.message.refusal
        && !refusal.is_empty()
    {
        tracing::error!("Model refused to answer: {refusal}");
        return Err(UserFacingError::AiRequestFailed(format!("response refused: {refusal}")).into());
    }

    match choice.message.content.map(|c| c.trim().to_string()) {
        Some(content) if !content.is_empty() => Ok(content),
        _ => {
            tracing::error!("Model returned an empty response");
            Err(UserFacingError::AiRequestFailed(String::from("received an empty response")).into())
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    refusal: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{ai::AiClient, errors::AppError};

    fn user_error(res: Result<String>) -> String {
        match res {
            Err(AppError::UserFacing(err)) => err.to_string(),
            other => panic!("Expected a user facing error, got {other:?}"),
        }
    }

    #[test]
    fn test_request_body() {
        let req = CompletionRequest::new("Regex expert", "Match emails", 220);
        let body = request_body("gpt-4o-mini", &req);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "Regex expert");
        assert_eq!(body["messages"][1]["content"], "Match emails");
        assert_eq!(body["max_tokens"], 220);
    }

    #[test]
    fn test_extract_content() {
        let res = json!({
            "choices": [{ "message": { "content": "  feat: add parser\n" }, "finish_reason": "stop" }]
        });
        assert_eq!(extract_content(res).unwrap(), "feat: add parser");
    }

    #[test]
    fn test_extract_content_errors() {
        assert_eq!(
            user_error(extract_content(json!({ "choices": [] }))),
            "AI request failed: received response with no choices"
        );
        assert_eq!(
            user_error(extract_content(json!({ "choices": [{ "message": { "content": "   " } }] }))),
            "AI request failed: received an empty response"
        );
        assert_eq!(
            user_error(extract_content(json!({ "choices": [{ "message": {} }] }))),
            "AI request failed: received an empty response"
        );
        assert_eq!(
            user_error(extract_content(json!({ "id": "x" }))),
            "AI request failed: couldn't parse api response"
        );
    }

    #[tokio::test]
    #[ignore] // Real API calls require valid api keys
    async fn test_openai_api() -> Result<()> {
        let config = AiConfig::default();
        let client = AiClient::new(&config)?;
        let res = client
            .complete(&CompletionRequest::new("Regex expert", "Match any email address", 220))
            .await?;
        assert!(!res.is_empty());
        Ok(())
    }
}
