use std::env;
use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_BACKEND_ERRORS, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS,
};
use crate::types::{
    Character, CharacterList, ChatReply, ChatRequest, ChatTurn, ClearReply, GeneratedImage,
    ImageReply, ImageRequest, Seed, SeedReply,
};

/// Base URL used when neither configuration nor the environment names one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api/";

/// Environment variable consulted for the base URL.
pub const BASE_URL_ENV: &str = "SEEDCHAT_BASE_URL";

const CHARACTERS_ENDPOINT: &str = "characters";
const CHAT_ENDPOINT: &str = "chat";
const GENERATE_IMAGE_ENDPOINT: &str = "generate-image";
const NEW_SEED_ENDPOINT: &str = "new-seed";
const CLEAR_ENDPOINT: &str = "clear";

/// The calls the chat controller makes against its backend.
///
/// Every method is one request/response cycle.  Implementations classify failures into
/// [`Error::Backend`] when the backend answered with an `error` field, and into the other
/// error variants when the exchange itself failed.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Fetch the selectable characters.
    async fn list_characters(&self) -> Result<Vec<Character>>;

    /// Send one chat message and wait for the assistant's answer.
    async fn chat(&self, request: ChatRequest) -> Result<ChatTurn>;

    /// Generate an image and decode its payload.
    async fn generate_image(&self, request: ImageRequest) -> Result<GeneratedImage>;

    /// Ask the backend to pick a fresh seed for subsequent images.
    async fn new_seed(&self) -> Result<Seed>;

    /// Drop the backend's conversation history for this session.
    async fn clear(&self) -> Result<()>;
}

/// HTTP client for the chat backend.
///
/// The backend keys conversation history and the image seed on a session cookie, so the
/// client keeps a cookie store for its whole lifetime.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: ReqwestClient,
    base_url: Url,
    timeout: Option<Duration>,
}

impl HttpBackend {
    /// Create a new client.
    ///
    /// The base URL can be provided directly or read from the `SEEDCHAT_BASE_URL`
    /// environment variable, falling back to [`DEFAULT_BASE_URL`].
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with custom settings.
    ///
    /// Requests never time out unless `timeout` is set.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url
            .or_else(|| env::var(BASE_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_base_url(&base_url)?;

        let mut builder = ReqwestClient::builder()
            .cookie_store(true)
            .default_headers(default_headers());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The base URL every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Send a request and return the raw body once the response has been classified.
    async fn execute(&self, endpoint: &'static str, request: RequestBuilder) -> Result<String> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = self.execute_inner(endpoint, request).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        match &result {
            Ok(_) => debug!(endpoint, "request succeeded"),
            Err(err) => {
                CLIENT_REQUEST_ERRORS.click();
                if err.is_backend() {
                    CLIENT_BACKEND_ERRORS.click();
                }
                debug!(endpoint, error = %err, "request failed");
            }
        }
        result
    }

    async fn execute_inner(&self, endpoint: &'static str, request: RequestBuilder) -> Result<String> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());
        let body = response.text().await.map_err(|e| {
            Error::http_client(
                format!("Failed to read {endpoint} response: {}", e),
                Some(Box::new(e)),
            )
        })?;
        check_response(endpoint, status, retry_after, &body)?;
        Ok(body)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &'static str) -> Result<T> {
        let url = self.endpoint(endpoint)?;
        debug!(endpoint, %url, "GET");
        let body = self.execute(endpoint, self.client.get(url)).await?;
        parse_body(endpoint, &body)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        payload: Option<&(impl serde::Serialize + Sync)>,
    ) -> Result<T> {
        let body = self.post_raw(endpoint, payload).await?;
        parse_body(endpoint, &body)
    }

    async fn post_raw(
        &self,
        endpoint: &'static str,
        payload: Option<&(impl serde::Serialize + Sync)>,
    ) -> Result<String> {
        let url = self.endpoint(endpoint)?;
        debug!(endpoint, %url, "POST");
        let mut request = self.client.post(url);
        if let Some(payload) = payload {
            request = request.json(payload);
        }
        self.execute(endpoint, request).await
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                self.timeout.map(|t| t.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn list_characters(&self) -> Result<Vec<Character>> {
        let list: CharacterList = self.get(CHARACTERS_ENDPOINT).await?;
        Ok(list.characters)
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatTurn> {
        let reply: ChatReply = self.post(CHAT_ENDPOINT, Some(&request)).await?;
        reply.into_turn()
    }

    async fn generate_image(&self, request: ImageRequest) -> Result<GeneratedImage> {
        let reply: ImageReply = self.post(GENERATE_IMAGE_ENDPOINT, Some(&request)).await?;
        reply.into_image(&request.prompt)
    }

    async fn new_seed(&self) -> Result<Seed> {
        let reply: SeedReply = self.post(NEW_SEED_ENDPOINT, None::<&()>).await?;
        Ok(reply.seed)
    }

    async fn clear(&self) -> Result<()> {
        let body = self.post_raw(CLEAR_ENDPOINT, None::<&()>).await?;
        // Any success counts; the confirmation text is informational only.
        let reply: ClearReply = serde_json::from_str(&body).unwrap_or_default();
        if let Some(message) = reply.message {
            debug!(%message, "history cleared");
        }
        Ok(())
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

fn parse_base_url(raw: &str) -> Result<Url> {
    // Url::join drops the last path segment unless the base ends in a slash.
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&normalized)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::validation(
            format!("unsupported URL scheme {scheme:?}"),
            Some("base_url".to_string()),
        )),
    }
}

/// Classify a response.
///
/// On a 2xx status a populated success field wins; otherwise a structured `error` field wins
/// over the HTTP status.
fn check_response(
    endpoint: &'static str,
    status: StatusCode,
    retry_after: Option<u64>,
    body: &str,
) -> Result<()> {
    let parsed = serde_json::from_str::<Value>(body).ok();
    if status.is_success()
        && parsed
            .as_ref()
            .is_some_and(|body| has_success_field(endpoint, body))
    {
        return Ok(());
    }
    if let Some(message) = parsed.as_ref().and_then(backend_error) {
        return Err(Error::backend(message, Some(status.as_u16())));
    }
    if status.is_success() {
        return Ok(());
    }
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    } else {
        body.trim().to_string()
    };
    Err(match status.as_u16() {
        400 => Error::bad_request(message),
        404 => Error::not_found(message, Some(endpoint.to_string())),
        408 => Error::timeout(message, None),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message, retry_after),
        code => Error::api(code, message),
    })
}

/// Whether the body carries the field that marks a successful reply for `endpoint`.
fn has_success_field(endpoint: &str, body: &Value) -> bool {
    let field = match endpoint {
        CHAT_ENDPOINT => "response",
        GENERATE_IMAGE_ENDPOINT => "image",
        _ => return false,
    };
    matches!(body.get(field), Some(Value::String(value)) if !value.is_empty())
}

/// Extract the backend's error text from a parsed body.
fn backend_error(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::String(message) if !message.is_empty() => Some(message.clone()),
        Value::Object(detail) => detail
            .get("message")
            .and_then(Value::as_str)
            .map(String::from),
        _ => None,
    }
}

fn parse_body<T: DeserializeOwned>(endpoint: &'static str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        Error::serialization(
            format!("Failed to parse {endpoint} response: {}", e),
            Some(Box::new(e)),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = parse_base_url("http://localhost:5000/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/");
        assert_eq!(
            url.join(GENERATE_IMAGE_ENDPOINT).unwrap().as_str(),
            "http://localhost:5000/api/generate-image"
        );
    }

    #[test]
    fn base_url_rejects_other_schemes() {
        let err = parse_base_url("ftp://example.com/").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn explicit_base_url_wins() {
        let backend = HttpBackend::new(Some("http://127.0.0.1:9999".to_string())).unwrap();
        assert_eq!(backend.base_url().as_str(), "http://127.0.0.1:9999/");
    }

    #[test]
    fn error_field_wins_over_status() {
        let err = check_response(
            CHAT_ENDPOINT,
            StatusCode::BAD_REQUEST,
            None,
            r#"{"error":"No message provided"}"#,
        )
        .unwrap_err();
        assert_eq!(err.backend_message(), Some("No message provided"));
        assert_eq!(err.status_code(), Some(400));

        let err = check_response(CHAT_ENDPOINT, StatusCode::OK, None, r#"{"error":"quota"}"#)
            .unwrap_err();
        assert_eq!(err.backend_message(), Some("quota"));
    }

    #[test]
    fn populated_response_wins_on_success() {
        let body = r#"{"response":"hi","error":"stale"}"#;
        assert!(check_response(CHAT_ENDPOINT, StatusCode::OK, None, body).is_ok());
        let turn = parse_body::<ChatReply>(CHAT_ENDPOINT, body)
            .unwrap()
            .into_turn()
            .unwrap();
        assert_eq!(turn.response, "hi");

        let body = r#"{"image":"UE5HIQ==","seed":1,"error":"stale"}"#;
        assert!(check_response(GENERATE_IMAGE_ENDPOINT, StatusCode::OK, None, body).is_ok());
    }

    #[test]
    fn error_still_wins_without_success_field() {
        let err = check_response(
            CHAT_ENDPOINT,
            StatusCode::OK,
            None,
            r#"{"response":"","error":"stale"}"#,
        )
        .unwrap_err();
        assert_eq!(err.backend_message(), Some("stale"));

        let err = check_response(
            CHAT_ENDPOINT,
            StatusCode::INTERNAL_SERVER_ERROR,
            None,
            r#"{"response":"hi","error":"boom"}"#,
        )
        .unwrap_err();
        assert_eq!(err.backend_message(), Some("boom"));
    }

    #[test]
    fn nested_error_message() {
        let body: Value = serde_json::from_str(r#"{"error":{"message":"boom"}}"#).unwrap();
        assert_eq!(backend_error(&body), Some("boom".to_string()));
    }

    #[test]
    fn empty_or_null_error_is_ignored() {
        assert!(check_response(CHAT_ENDPOINT, StatusCode::OK, None, r#"{"error":""}"#).is_ok());
        assert!(check_response(CHAT_ENDPOINT, StatusCode::OK, None, r#"{"error":null}"#).is_ok());
    }

    #[test]
    fn status_without_error_field() {
        let err = check_response(CHAT_ENDPOINT, StatusCode::NOT_FOUND, None, "<html>").unwrap_err();
        assert!(err.is_not_found());
        assert!(!err.is_backend());

        let err = check_response(
            CHAT_ENDPOINT,
            StatusCode::SERVICE_UNAVAILABLE,
            Some(3),
            "",
        )
        .unwrap_err();
        assert!(err.is_server_error());
        assert!(err.to_string().contains("retry after 3 seconds"));

        let err = check_response(CHAT_ENDPOINT, StatusCode::IM_A_TEAPOT, None, "").unwrap_err();
        assert_eq!(err.status_code(), Some(418));
    }

    #[test]
    fn success_with_non_json_body_passes_check() {
        assert!(check_response(CLEAR_ENDPOINT, StatusCode::OK, None, "").is_ok());
    }

    #[test]
    fn malformed_body_is_serialization_error() {
        let err = parse_body::<SeedReply>(NEW_SEED_ENDPOINT, "not json").unwrap_err();
        assert!(err.is_serialization());
        let err = parse_body::<SeedReply>(NEW_SEED_ENDPOINT, "{}").unwrap_err();
        assert!(err.is_serialization());
    }
}
