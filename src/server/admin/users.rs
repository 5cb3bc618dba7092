use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};

use crate::auth::{RequireAdmin, TokenGenerator};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{CreateTokenResponse, CreateUserRequest, CreateUserTokenRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::types::User;

const MAX_TOKEN_RETRIES: u32 = 3;

pub async fn create_user(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> impl IntoResponse {
    let user =
        User::new(&req.display_name).map_err(|e| ApiError::from_store(e, "User not found"))?;

    state
        .store
        .create_user(&user)
        .api_err("Failed to create user")?;

    tracing::info!("Created user {} ({})", user.display_name, user.id);
    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

pub async fn list_users(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let users = state.store.list_users().api_err("Failed to list users")?;
    Ok::<_, ApiError>(Json(ApiResponse::success(users)))
}

pub async fn create_user_token(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateUserTokenRequest>,
) -> impl IntoResponse {
    let user = state
        .store
        .get_user(&id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    let expires_at = match req.expires_in_seconds {
        Some(seconds) if seconds < 0 => {
            return Err(ApiError::bad_request(
                "expires_in_seconds cannot be negative",
            ));
        }
        Some(seconds) => Some(Utc::now() + Duration::seconds(seconds)),
        None => None,
    };

    let generator = TokenGenerator::new();
    for _ in 0..MAX_TOKEN_RETRIES {
        let issued = generator
            .issue(Some(&user.id), expires_at)
            .api_err("Failed to generate token")?;

        match state.store.create_token(&issued.token) {
            Ok(()) => {
                return Ok((
                    StatusCode::CREATED,
                    Json(ApiResponse::success(CreateTokenResponse {
                        token: issued.raw,
                        metadata: issued.token,
                    })),
                ));
            }
            Err(Error::TokenLookupCollision) => continue,
            Err(e) => {
                tracing::error!("Failed to store token: {e}");
                return Err(ApiError::internal("Failed to create token"));
            }
        }
    }

    Err(ApiError::internal("Failed to create token after retries"))
}
