mod communities;
mod memberships;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/communities", get(communities::list_communities))
        .route("/communities", post(communities::create_community))
        .route("/communities/{id}", get(communities::get_community))
        .route("/communities/{id}/members", get(communities::list_members))
        .route(
            "/communities/{id}/membership",
            post(memberships::join_community).delete(memberships::leave_community),
        )
        .route("/me/communities", get(memberships::list_my_communities))
}
