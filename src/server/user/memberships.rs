use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{JoinResponse, LeaveResponse};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::types::MemberRole;

pub async fn join_community(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state
        .directory()
        .join_community(&id, &auth.user.id)
        .map_err(|e| ApiError::from_store(e, "Community not found"))?;

    let community = state
        .store
        .get_community(&id)
        .api_err("Failed to get community")?
        .or_not_found("Community not found")?;

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(JoinResponse {
            role: MemberRole::Member,
            community,
        })),
    ))
}

pub async fn leave_community(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state
        .store
        .get_community(&id)
        .api_err("Failed to get community")?
        .or_not_found("Community not found")?;

    let removed = state
        .directory()
        .leave_community(&id, &auth.user.id)
        .map_err(|e| ApiError::from_store(e, "Community not found"))?;

    let community = state
        .store
        .get_community(&id)
        .api_err("Failed to get community")?
        .or_not_found("Community not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(LeaveResponse {
        removed,
        community,
    })))
}

pub async fn list_my_communities(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let communities = state
        .store
        .list_user_communities(&auth.user.id)
        .api_err("Failed to list communities")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(communities)))
}
