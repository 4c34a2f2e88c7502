use std::time::Duration;

use color_eyre::eyre::Context;
use reqwest::{
    Client, ClientBuilder, StatusCode,
    header::{self, HeaderMap, HeaderValue},
};
use tracing::instrument;

use crate::{
    config::AiConfig,
    errors::{Result, UserFacingError},
    model::CompletionRequest,
};

mod openai;

/// A client to communicate with an OpenAI-compatible chat completions API
#[cfg_attr(debug_assertions, derive(Debug))]
pub struct AiClient<'a> {
    inner: Client,
    config: &'a AiConfig,
    api_key: String,
}
impl<'a> AiClient<'a> {
    /// Creates a new AI client for the given configuration.
    ///
    /// Fails if the api key env variable is not set.
    pub fn new(config: &'a AiConfig) -> Result<Self> {
        let api_key = config.api_key()?;

        // Construct the base headers for all requests
        let mut headers = HeaderMap::new();
        headers.append(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // Build the reqwest client
        let inner = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(2 * 60))
            .user_agent(concat!("devcli/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .wrap_err("Couldn't build AI client")?;

        Ok(AiClient { inner, config, api_key })
    }

    /// Sends the request and returns the trimmed text of the first choice
    #[instrument(skip_all, fields(model = %self.config.model, max_tokens = request.max_tokens))]
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| UserFacingError::AiInvalidApiKey(self.config.api_key_env.clone()))?;
        auth.set_sensitive(true);

        let req = openai::build_request(&self.inner, self.config, request)
            .header(header::AUTHORIZATION, auth)
            .build()
            .wrap_err("Couldn't build api request")?;

        // Call the API
        tracing::debug!("Calling completions API: {}", req.url());
        let res = self.inner.execute(req).await.map_err(|err| {
            if err.is_timeout() {
                tracing::error!("Request timeout: {err:?}");
                UserFacingError::AiRequestTimeout
            } else if err.is_connect() {
                tracing::error!("Couldn't connect to the API: {err:?}");
                UserFacingError::AiRequestFailed(String::from("error connecting to the provider"))
            } else {
                tracing::error!("Couldn't perform the request: {err:?}");
                UserFacingError::AiRequestFailed(err.to_string())
            }
        })?;

        // Check the response status
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(status_error(status, &body, &self.config.api_key_env).into());
        }

        openai::parse_response(res).await
    }
}

/// Maps a non-successful response status into the error displayed to the user
fn status_error(status: StatusCode, body: &str, api_key_env: &str) -> UserFacingError {
    let status_str = status.as_str();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            tracing::warn!("Got response [{status_str}] {}", status.canonical_reason().unwrap_or_default());
            tracing::debug!("{body}");
            UserFacingError::AiInvalidApiKey(api_key_env.to_string())
        }
        StatusCode::TOO_MANY_REQUESTS => {
            tracing::info!("Got response [{status_str}] Too Many Requests");
            tracing::debug!("{body}");
            UserFacingError::AiRateLimit
        }
        StatusCode::SERVICE_UNAVAILABLE => {
            tracing::info!("Got response [{status_str}] Service Unavailable");
            tracing::debug!("{body}");
            UserFacingError::AiUnavailable
        }
        _ => {
            tracing::error!("Got response [{status_str}]:\n{body}");
            match status.canonical_reason() {
                Some(reason) => UserFacingError::AiRequestFailed(format!("received {status_str} {reason} response")),
                None => UserFacingError::AiRequestFailed(format!("received {status_str} response")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_status_errors() {
        assert_eq!(
            status_error(StatusCode::UNAUTHORIZED, "", "OPENAI_API_KEY"),
            UserFacingError::AiInvalidApiKey("OPENAI_API_KEY".into())
        );
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "", "OPENAI_API_KEY"),
            UserFacingError::AiRateLimit
        );
        assert_eq!(
            status_error(StatusCode::SERVICE_UNAVAILABLE, "", "OPENAI_API_KEY"),
            UserFacingError::AiUnavailable
        );
        assert_eq!(
            status_error(StatusCode::BAD_REQUEST, "{}", "OPENAI_API_KEY").to_string(),
            "AI request failed: received 400 Bad Request response"
        );
    }

    #[test]
    fn test_every_status_error_is_prefixed() {
        for code in [401, 403, 404, 429, 500, 503] {
            let status = StatusCode::from_u16(code).unwrap();
            let msg = status_error(status, "", "KEY").to_string();
            assert!(msg.starts_with("AI request failed: "), "{msg}");
        }
    }
}
