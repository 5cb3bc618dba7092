use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::admin::admin_router;
use super::map::map_router;
use super::user::user_router;
use crate::community::CommunityDirectory;
use crate::config::MapSettings;
use crate::notify::{Notifier, TracingNotifier};
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub data_dir: PathBuf,
    pub map: MapSettings,
    /// Receives the outcome of every community mutation.
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, data_dir: PathBuf, map: MapSettings) -> Self {
        Self {
            store,
            data_dir,
            map,
            notifier: Arc::new(TracingNotifier),
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub(crate) fn directory(&self) -> CommunityDirectory {
        CommunityDirectory::uncached(Arc::clone(&self.store), Arc::clone(&self.notifier))
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        response.status().as_u16(),
        start.elapsed().as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/admin", admin_router())
        .nest("/api/v1", user_router().merge(map_router()))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
