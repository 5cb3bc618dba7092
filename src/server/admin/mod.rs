mod communities;
mod users;

use std::sync::Arc;

use axum::{Router, routing::post};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(users::create_user).get(users::list_users))
        .route("/users/{id}/tokens", post(users::create_user_token))
        .route(
            "/communities/{id}/reconcile",
            post(communities::reconcile_member_count),
        )
}
