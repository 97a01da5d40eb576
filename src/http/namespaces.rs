use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};

use crate::identity::{Namespace, WalletAddress};
use crate::models::identity::{AddressIdentity, NameIdentity};
use crate::state::AppState;

use super::{HttpError, request_credentials};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{namespace}/names/{name}", get(name_to_address))
        .route("/{namespace}/addresses/{address}", get(address_to_name))
}

async fn name_to_address(
    Path((namespace, name)): Path<(String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AddressIdentity>, HttpError> {
    let namespace: Namespace = namespace.parse()?;
    let credentials = request_credentials(&headers, &state.default_credentials)?;
    let identity = state
        .resolver
        .resolve_name_in(namespace, &name, &credentials)
        .await?;
    Ok(Json(identity))
}

async fn address_to_name(
    Path((namespace, address)): Path<(String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<NameIdentity>, HttpError> {
    let namespace: Namespace = namespace.parse()?;
    let address: WalletAddress = address.parse()?;
    let credentials = request_credentials(&headers, &state.default_credentials)?;
    let identity = state
        .resolver
        .resolve_address_in(namespace, &address, &credentials)
        .await?;
    Ok(Json(identity))
}
