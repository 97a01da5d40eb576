use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use crate::error::TransportError;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain";
pub const CONTENT_TYPE_HTML: &str = "text/html";

const USER_AGENT: &str = concat!("wallet-names-api/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
}

impl Body {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => Some(value),
            Body::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            Body::Json(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Body,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// JSON body, or `Value::Null` when the provider answered with text.
    pub fn json(&self) -> &Value {
        self.body.as_json().unwrap_or(&Value::Null)
    }
}

/// Thin wrapper around `reqwest` with sensible defaults: bodies are decoded
/// according to the response content type, and non-2xx statuses are handed
/// back to the caller instead of being turned into errors.
#[derive(Clone)]
pub struct HttpTransport {
    inner: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        assert!(
            timeout >= Duration::from_millis(100),
            "Timeout below 100ms is unsafe"
        );
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { inner: client })
    }

    pub async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Response, TransportError> {
        let request = self.inner.get(url).headers(header_map(headers)?);
        self.send(url, request).await
    }

    pub async fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<Response, TransportError> {
        let request = self.inner.post(url).headers(header_map(headers)?).json(body);
        self.send(url, request).await
    }

    /// GET whose body is read as JSON whatever the content type claims.
    /// Bodies that are not JSON come back as text.
    pub async fn get_lenient(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Response, TransportError> {
        let request = self.inner.get(url).headers(header_map(headers)?);
        let (status, _, bytes) = self.fetch(url, request).await?;
        Ok(Response {
            status,
            body: decode_lenient(&bytes),
        })
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response, TransportError> {
        let (status, content_type, bytes) = self.fetch(url, request).await?;
        let body = decode_body(url, &content_type, &bytes)?;
        Ok(Response { status, body })
    }

    async fn fetch(
        &self,
        url: &str,
        request: RequestBuilder,
    ) -> Result<(u16, String, Vec<u8>), TransportError> {
        let response = request.send().await.map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;
        let status = response.status().as_u16();
        let content_type = response_content_type(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
        );
        let bytes = response
            .bytes()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;
        debug!(%url, status, %content_type, len = bytes.len(), "HTTP response received");
        Ok((status, content_type, bytes.to_vec()))
    }
}

fn header_map(headers: &[(&str, &str)]) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| TransportError::InvalidHeader {
                name: (*name).to_string(),
            })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| TransportError::InvalidHeader {
                name: (*name).to_string(),
            })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Media type of a `Content-Type` header without its parameters. A missing
/// header is treated as JSON.
fn response_content_type(header: Option<&str>) -> String {
    match header {
        Some(value) => value
            .split(';')
            .next()
            .map(|media| media.trim().to_ascii_lowercase())
            .filter(|media| !media.is_empty())
            .unwrap_or_else(|| CONTENT_TYPE_JSON.to_string()),
        None => {
            debug!("No Content-Type header, assuming JSON");
            CONTENT_TYPE_JSON.to_string()
        }
    }
}

fn decode_body(url: &str, content_type: &str, bytes: &[u8]) -> Result<Body, TransportError> {
    match content_type {
        CONTENT_TYPE_TEXT | CONTENT_TYPE_HTML => {
            Ok(Body::Text(String::from_utf8_lossy(bytes).into_owned()))
        }
        CONTENT_TYPE_JSON => {
            if bytes.is_empty() {
                return Ok(Body::Json(Value::Null));
            }
            serde_json::from_slice(bytes)
                .map(Body::Json)
                .map_err(|source| TransportError::Decode {
                    url: url.to_string(),
                    source,
                })
        }
        other => Err(TransportError::UnsupportedContentType {
            url: url.to_string(),
            content_type: other.to_string(),
        }),
    }
}

fn decode_lenient(bytes: &[u8]) -> Body {
    if bytes.is_empty() {
        return Body::Json(Value::Null);
    }
    serde_json::from_slice(bytes)
        .map(Body::Json)
        .unwrap_or_else(|_| Body::Text(String::from_utf8_lossy(bytes).into_owned()))
}
