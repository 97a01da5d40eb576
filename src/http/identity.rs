use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use tracing::debug;

use crate::identity::WalletAddress;
use crate::models::identity::{AddressIdentity, NameIdentity};
use crate::state::AppState;

use super::{HttpError, request_credentials};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/names/{name}", get(resolve_name))
        .route("/addresses/{address}", get(resolve_address))
}

/// Malformed and unregistered names both come back as an empty identity.
async fn resolve_name(
    Path(name): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AddressIdentity>, HttpError> {
    let credentials = request_credentials(&headers, &state.default_credentials)?;
    debug!(%name, "Resolving wallet name");
    let identity = state.resolver.resolve_name(&name, &credentials).await?;
    Ok(Json(identity))
}

async fn resolve_address(
    Path(address): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<NameIdentity>, HttpError> {
    let address: WalletAddress = address.parse()?;
    let credentials = request_credentials(&headers, &state.default_credentials)?;
    let identity = state
        .resolver
        .resolve_address(&address, &credentials)
        .await?;
    Ok(Json(identity))
}
