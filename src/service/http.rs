use std::time::Duration;

use color_eyre::eyre::Context;
use reqwest::{
    ClientBuilder, Url,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::DevService;
use crate::{
    errors::{Result, UserFacingError},
    model::{HttpBody, HttpRequest, HttpResponse},
};

/// Timeout of the API tester requests
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(20);
/// Maximum characters of the response body displayed on the terminal
pub const DISPLAY_BODY_LIMIT: usize = 3000;
/// Maximum characters of the response body sent for analysis
pub const AI_BODY_LIMIT: usize = 4000;

impl DevService {
    /// Sends an arbitrary HTTP request, returning the response status and body
    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    pub async fn send_request(
        &self,
        request: HttpRequest,
        cancellation_token: &CancellationToken,
    ) -> Result<HttpResponse> {
        let url = Url::parse(&request.url).map_err(|err| {
            tracing::warn!("Invalid url '{}': {err}", request.url);
            UserFacingError::HttpInvalidUrl(request.url.clone())
        })?;
        let headers = build_headers(&request.headers)?;

        let client = ClientBuilder::new()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("devcli/", env!("CARGO_PKG_VERSION")))
            .build()
            .wrap_err("Couldn't build HTTP client")?;

        let mut req = client.request(request.method.into(), url).headers(headers);
        if request.method.allows_body() {
            req = match request.body {
                Some(HttpBody::Json(json)) => req.json(&json),
                Some(HttpBody::Text(text)) => req.body(text),
                None => req,
            };
        }

        tracing::debug!("Sending request");
        let send = async {
            let res = req.send().await?;
            let status = res.status();
            let body = res.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };
        let (status, body) = tokio::select! {
            biased;
            _ = cancellation_token.cancelled() => {
                tracing::info!("HTTP request cancelled");
                return Err(UserFacingError::Cancelled.into());
            }
            res = send => res.map_err(|err| {
                if err.is_timeout() {
                    tracing::warn!("Request timeout: {err:?}");
                    UserFacingError::HttpTimeout(HTTP_TIMEOUT.as_secs())
                } else {
                    tracing::warn!("Request failed: {err:?}");
                    UserFacingError::HttpRequestFailed(error_chain(&err))
                }
            })?,
        };
        tracing::info!("Got response [{}]", status.as_str());

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

/// Parses a JSON object of string values into headers, returns [None] if it's not valid
pub fn parse_json_headers(raw: &str) -> Option<Vec<(String, String)>> {
    let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw).ok()?;
    map.into_iter()
        .map(|(name, value)| match value {
            serde_json::Value::String(value) => Some((name, value)),
            serde_json::Value::Number(_) | serde_json::Value::Bool(_) => Some((name, value.to_string())),
            _ => None,
        })
        .collect()
}

/// Parses a `name:value` header
pub fn parse_header_arg(raw: &str) -> Result<(String, String), String> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.trim().to_string())),
        _ => Err(format!("Invalid header '{raw}', expected 'name:value'")),
    }
}

fn build_headers(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| UserFacingError::HttpInvalidHeader(name.clone()))?;
        let value = HeaderValue::from_str(value).map_err(|_| UserFacingError::HttpInvalidHeader(name.to_string()))?;
        map.append(name, value);
    }
    Ok(map)
}

/// Joins the error with its sources, as reqwest errors are usually not very descriptive on their own
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(err) = source {
        msg.push_str(": ");
        msg.push_str(&err.to_string());
        source = err.source();
    }
    msg
}
