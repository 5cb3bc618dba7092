use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};

use crate::map::{TokenResponse, markers_for};
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};

pub fn map_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/map/token", get(map_token))
        .route("/map/markers", get(map_markers))
}

/// Hands out the configured map access token as a bare `{ "token": ... }`
/// object, the shape map clients expect.
async fn map_token(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let token = state
        .map
        .token
        .clone()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            tracing::warn!("Map token requested but none is configured");
            ApiError::unavailable("Map token is not configured")
        })?;

    Ok::<_, ApiError>(Json(TokenResponse { token: Some(token) }))
}

async fn map_markers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let communities = state
        .store
        .list_communities()
        .api_err("Failed to list communities")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(markers_for(&communities))))
}
