//! HTTP transport built on `reqwest`.

use std::time::Duration;

use futures::TryStreamExt;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{ChatReply, ChatRequest, ChatResponseBody, ChatTransport, TransportError};

/// How to interpret a successful response body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Read JSON bodies whole, stream everything else.
    #[default]
    Auto,
    /// Always stream the body as text.
    Stream,
    /// Always read the body as `{ "response": string }`.
    Json,
}

impl ResponseMode {
    /// Lowercase name used in configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Stream => "stream",
            Self::Json => "json",
        }
    }
}

/// Transport posting chat requests to a single backend endpoint.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: Url,
    mode: ResponseMode,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint.as_str())
            .field("mode", &self.mode)
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport with its own HTTP client.
    ///
    /// `timeout` bounds the whole exchange, including reading a streamed body.
    pub fn new(endpoint: Url, mode: ResponseMode, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(endpoint, mode, http))
    }

    /// Create a transport with a custom reqwest client.
    #[must_use]
    pub fn with_client(endpoint: Url, mode: ResponseMode, http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint,
            mode,
        }
    }

    /// Get the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn wants_whole_body(&self, headers: &HeaderMap) -> bool {
        match self.mode {
            ResponseMode::Json => true,
            ResponseMode::Stream => false,
            ResponseMode::Auto => headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(is_json_content_type),
        }
    }
}

fn is_json_content_type(value: &str) -> bool {
    let mime = value.split(';').next().unwrap_or_default().trim();
    mime.eq_ignore_ascii_case("application/json")
}

#[async_trait::async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, request: ChatRequest) -> Result<ChatReply, TransportError> {
        debug!(
            name: "chat.http.post",
            endpoint = %self.endpoint,
            session_id = %request.session_id,
            "Posting chat request"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if response.content_length() == Some(0) {
            return Err(TransportError::MissingBody);
        }

        if self.wants_whole_body(response.headers()) {
            let body = response.bytes().await?;
            let parsed: ChatResponseBody = serde_json::from_slice(&body)?;
            debug!(name: "chat.http.body", bytes = body.len(), "Read whole reply body");
            return Ok(ChatReply::Full(parsed.response));
        }

        let stream = response
            .bytes_stream()
            .map_err(|e| TransportError::Stream(e.to_string()));
        Ok(ChatReply::Stream(Box::pin(stream)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn transport(mode: ResponseMode) -> HttpTransport {
        let endpoint = Url::parse("http://127.0.0.1:8000/chat").unwrap();
        HttpTransport::with_client(endpoint, mode, reqwest::Client::new())
    }

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn test_auto_mode_follows_content_type() {
        let t = transport(ResponseMode::Auto);
        assert!(t.wants_whole_body(&headers("application/json")));
        assert!(t.wants_whole_body(&headers("Application/JSON; charset=utf-8")));
        assert!(!t.wants_whole_body(&headers("text/plain; charset=utf-8")));
        assert!(!t.wants_whole_body(&HeaderMap::new()));
    }

    #[test]
    fn test_forced_modes_ignore_content_type() {
        assert!(transport(ResponseMode::Json).wants_whole_body(&headers("text/plain")));
        assert!(!transport(ResponseMode::Stream).wants_whole_body(&headers("application/json")));
    }
}
