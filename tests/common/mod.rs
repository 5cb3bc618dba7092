#![allow(dead_code)]

#[cfg(feature = "cli")]
mod server;

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use hearth::auth::TokenGenerator;
use hearth::config::MapSettings;
use hearth::notify::MemoryNotifier;
use hearth::server::{AppState, create_router};
use hearth::store::{SqliteStore, Store};
use hearth::types::User;
#[cfg(feature = "cli")]
pub use server::TestServer;

pub struct TestApp {
    pub store: Arc<SqliteStore>,
    pub notifier: Arc<MemoryNotifier>,
    pub admin_token: String,
    router: Router,
    _temp_dir: TempDir,
}

pub struct Response {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl Response {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn error(&self) -> Option<&str> {
        self.body["error"].as_str()
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_map_token(None)
    }

    pub fn with_map_token(map_token: Option<&str>) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = Arc::new(SqliteStore::new(temp_dir.path().join("hearth.db")).expect("open store"));
        store.initialize().expect("initialize store");

        let issued = TokenGenerator::new().issue(None, None).expect("issue admin token");
        store.create_token(&issued.token).expect("store admin token");

        let notifier = Arc::new(MemoryNotifier::new());
        let settings = MapSettings {
            token: map_token.map(str::to_string),
            ..MapSettings::default()
        };
        let state = AppState::new(
            Arc::clone(&store) as Arc<dyn Store>,
            temp_dir.path().to_path_buf(),
            settings,
        )
        .with_notifier(notifier.clone());

        Self {
            store,
            notifier,
            admin_token: issued.raw,
            router: create_router(Arc::new(state)),
            _temp_dir: temp_dir,
        }
    }

    /// Creates a user directly in the store and returns it with a raw token.
    pub fn create_user(&self, name: &str) -> (User, String) {
        let user = User::new(name).expect("valid display name");
        self.store.create_user(&user).expect("create user");

        let issued = TokenGenerator::new()
            .issue(Some(&user.id), None)
            .expect("issue user token");
        self.store.create_token(&issued.token).expect("store user token");
        (user, issued.raw)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        Response {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Response {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Creates a community through the API and returns its id.
    pub async fn create_community(&self, token: &str, body: Value) -> String {
        let resp = self.post("/api/v1/communities", Some(token), body).await;
        assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
        resp.data()["id"].as_str().expect("community id").to_string()
    }
}
