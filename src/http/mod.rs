use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::header::{ACCEPT, CONTENT_TYPE, HeaderName};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ProviderError;
use crate::identity::{IdentityError, Namespace};
use crate::providers::Credentials;
use crate::state::AppState;

mod identity;
mod namespaces;

pub const BACKPACK_JWT_HEADER: &str = "x-backpack-jwt";
pub const TWITTER_BEARER_HEADER: &str = "x-twitter-bearer";

pub fn router(state: AppState) -> Router {
    assert!(
        state.start_time.elapsed() < Duration::from_secs(86_400),
        "Application uptime exceeds 24 hours before router creation"
    );

    // Wallet UIs call this straight from the browser
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static(BACKPACK_JWT_HEADER),
            HeaderName::from_static(TWITTER_BEARER_HEADER),
        ])
        .max_age(Duration::from_secs(3600));

    let identity_router = identity::router().with_state(state.clone());
    let namespace_router = namespaces::router().with_state(state.clone());
    Router::new()
        .route("/health", get(health_live))
        .nest("/identity", identity_router)
        .nest("/namespaces", namespace_router)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_live(State(state): State<AppState>) -> Result<Json<HealthResponse>, HttpError> {
    let uptime = state.start_time.elapsed().as_secs();
    assert!(
        uptime <= 31_536_000,
        "Uptime exceeds one year without restart"
    );
    let response = HealthResponse {
        status: "live",
        uptime_seconds: uptime,
        namespaces: state.resolver.namespaces(),
    };
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: u64,
    namespaces: Vec<Namespace>,
}

/// Credentials sent with the request, topped up from the server defaults.
fn request_credentials(
    headers: &HeaderMap,
    defaults: &Credentials,
) -> Result<Credentials, HttpError> {
    let supplied = Credentials {
        backpack_jwt: header_value(headers, BACKPACK_JWT_HEADER)?,
        twitter_bearer: header_value(headers, TWITTER_BEARER_HEADER)?,
    };
    Ok(supplied.or(defaults))
}

fn header_value(headers: &HeaderMap, name: &str) -> Result<Option<String>, HttpError> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| {
        HttpError::new(
            StatusCode::BAD_REQUEST,
            format!("Header {name} must be visible ASCII"),
        )
    })?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: String) -> Self {
        assert!(status != StatusCode::OK, "Error status cannot be 200");
        assert!(!message.is_empty(), "Error message cannot be empty");
        Self { status, message }
    }
}

impl From<ProviderError> for HttpError {
    fn from(err: ProviderError) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, err.to_string())
    }
}

impl From<IdentityError> for HttpError {
    fn from(err: IdentityError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        info!("HTTP error: {}", self.message);
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}
