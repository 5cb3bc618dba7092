#![allow(deprecated)] // cargo_bin deprecation only affects custom build dirs

use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{Value, json};
use tempfile::TempDir;

/// A `hearth serve` process on a free local port, backed by a fresh data dir.
pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub admin_token: String,
    client: Client,
    server_process: Option<Child>,
}

impl TestServer {
    pub fn start() -> Self {
        Self::start_with_map_token(None)
    }

    /// Starts the server with `HEARTH_MAP_TOKEN` set, or explicitly unset.
    pub fn start_with_map_token(map_token: Option<&str>) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let data_dir = temp_dir.path();
        let binary = assert_cmd::cargo::cargo_bin("hearth");

        let init_output = Command::new(&binary)
            .args(["admin", "init", "--data-dir"])
            .arg(data_dir)
            .arg("--non-interactive")
            .output()
            .expect("run init");
        assert!(
            init_output.status.success(),
            "Failed to initialize database"
        );

        let admin_token = std::fs::read_to_string(data_dir.join(".admin_token"))
            .expect("read admin token")
            .trim()
            .to_string();

        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        drop(listener);

        let base_url = format!("http://127.0.0.1:{port}");

        let mut command = Command::new(&binary);
        command
            .args(["serve", "--data-dir"])
            .arg(data_dir)
            .args(["--host", "127.0.0.1", "--port"])
            .arg(port.to_string())
            .env_remove("RUST_LOG")
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        match map_token {
            Some(token) => command.env("HEARTH_MAP_TOKEN", token),
            None => command.env_remove("HEARTH_MAP_TOKEN"),
        };
        let server_process = command.spawn().expect("start server");

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("build client");

        let server = Self {
            temp_dir,
            base_url,
            admin_token,
            client,
            server_process: Some(server_process),
        };
        server.wait_for_ready();
        server
    }

    fn wait_for_ready(&self) {
        for _ in 0..50 {
            if self
                .client
                .get(format!("{}/health", self.base_url))
                .send()
                .is_ok()
            {
                return;
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        panic!("Server did not become ready");
    }

    pub fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Creates a user through the admin API and returns a raw token for it.
    pub fn create_user_token(&self, name: &str) -> String {
        let user: Value = self
            .client
            .post(format!("{}/api/v1/admin/users", self.base_url))
            .bearer_auth(&self.admin_token)
            .json(&json!({ "display_name": name }))
            .send()
            .expect("create user")
            .json()
            .expect("parse user response");
        let user_id = user["data"]["id"].as_str().expect("user id");

        let token: Value = self
            .client
            .post(format!(
                "{}/api/v1/admin/users/{user_id}/tokens",
                self.base_url
            ))
            .bearer_auth(&self.admin_token)
            .json(&json!({}))
            .send()
            .expect("create user token")
            .json()
            .expect("parse token response");

        token["data"]["token"]
            .as_str()
            .expect("user token")
            .to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(mut process) = self.server_process.take() {
            let _ = process.kill();
            let _ = process.wait();
        }
    }
}
