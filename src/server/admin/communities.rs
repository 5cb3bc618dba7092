use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::ReconcileResponse;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};

/// Rewrites a community's member count from its membership rows.
pub async fn reconcile_member_count(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let community = state
        .store
        .get_community(&id)
        .api_err("Failed to get community")?
        .or_not_found("Community not found")?;

    let member_count = state
        .store
        .reconcile_member_count(&id)
        .api_err("Failed to reconcile member count")?;

    if member_count != community.member_count {
        tracing::warn!(
            "Member count for {id} drifted: stored {}, actual {member_count}",
            community.member_count
        );
    }

    Ok::<_, ApiError>(Json(ApiResponse::success(ReconcileResponse {
        community_id: id,
        previous_count: community.member_count,
        member_count,
    })))
}
