use crate::identity::IdentityError;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("don't know how to decode content type '{content_type}' from {url}")]
    UnsupportedContentType { url: String, content_type: String },
    #[error("invalid header {name}")]
    InvalidHeader { name: String },
}

/// Any provider failure other than "not found". These are never swallowed.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("RPC call {method} failed: {message}")]
    Rpc { method: &'static str, message: String },
    #[error("{provider} answered with HTTP status {status}")]
    Status { provider: &'static str, status: u16 },
    #[error("{provider} rejected the supplied credential")]
    Unauthorized { provider: &'static str },
    #[error("{provider} returned an unexpected response: {detail}")]
    UnexpectedResponse {
        provider: &'static str,
        detail: String,
    },
    #[error("{provider} returned malformed account data: {detail}")]
    AccountData {
        provider: &'static str,
        detail: String,
    },
    #[error("{provider} returned an invalid wallet address: {source}")]
    InvalidAddress {
        provider: &'static str,
        #[source]
        source: IdentityError,
    },
}

impl ProviderError {
    pub fn unexpected(provider: &'static str, detail: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            provider,
            detail: detail.into(),
        }
    }

    pub fn account_data(provider: &'static str, detail: impl Into<String>) -> Self {
        Self::AccountData {
            provider,
            detail: detail.into(),
        }
    }
}
