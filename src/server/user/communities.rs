use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::community::{CommunityDraft, nearby};
use crate::server::AppState;
use crate::server::dto::ListCommunitiesParams;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::nearby_origin;

pub async fn list_communities(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListCommunitiesParams>,
) -> impl IntoResponse {
    let origin = nearby_origin(&params)?;

    let communities = state
        .store
        .list_communities()
        .api_err("Failed to list communities")?;

    let response = match origin {
        Some((origin, radius_km)) => {
            Json(ApiResponse::success(nearby(&communities, origin, radius_km))).into_response()
        }
        None => Json(ApiResponse::success(communities)).into_response(),
    };
    Ok::<_, ApiError>(response)
}

pub async fn get_community(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let community = state
        .store
        .get_community(&id)
        .api_err("Failed to get community")?
        .or_not_found("Community not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(community)))
}

pub async fn create_community(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(draft): Json<CommunityDraft>,
) -> impl IntoResponse {
    let community = state
        .directory()
        .create_community(draft, &auth.user.id)
        .map_err(|e| ApiError::from_store(e, "Community not found"))?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(community))))
}

pub async fn list_members(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    store
        .get_community(&id)
        .api_err("Failed to get community")?
        .or_not_found("Community not found")?;

    let members = store.list_members(&id).api_err("Failed to list members")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(members)))
}
