use clap::ValueEnum;

/// HTTP methods supported by the API tester
#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug, strum::Display, strum::EnumIter, strum::EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[value(rename_all = "UPPER")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Whether a body can be sent with this method
    pub fn allows_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// The body sent along with a request
#[derive(Clone, PartialEq, Debug)]
pub enum HttpBody {
    /// A valid JSON document, sent as `application/json`
    Json(serde_json::Value),
    /// Anything else, sent verbatim
    Text(String),
}

impl HttpBody {
    /// Sends valid JSON as such, and any other content as raw text
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match serde_json::from_str(&raw) {
            Ok(json) => HttpBody::Json(json),
            Err(_) => HttpBody::Text(raw),
        }
    }
}

/// A request issued by the API tester
#[derive(Clone, PartialEq, Debug)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<HttpBody>,
}

/// The response received by the API tester
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct HttpResponse {
    /// Numeric status code
    pub status: u16,
    /// Canonical reason phrase, if known
    pub reason: String,
    /// The body as text
    pub body: String,
}
