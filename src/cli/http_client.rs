use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::credentials::Credentials;

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl ApiClient {
    pub fn new(creds: &Credentials) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: creds.server_url.trim_end_matches('/').to_string(),
            token: creds.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> anyhow::Result<T> {
        let resp = request.bearer_auth(&self.token).send()?;
        handle_response(resp)
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        self.send(self.client.get(self.url(path)))
    }

    /// GET with query parameters appended by reqwest.
    pub fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> anyhow::Result<T> {
        self.send(self.client.get(self.url(path)).query(query))
    }

    pub fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> anyhow::Result<T> {
        self.send(self.client.post(self.url(path)).json(body))
    }

    pub fn delete<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        self.send(self.client.delete(self.url(path)))
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn handle_response<T: DeserializeOwned>(resp: Response) -> anyhow::Result<T> {
    let status = resp.status();
    if status.is_success() {
        let api_resp: ApiResponse<T> = resp.json()?;
        api_resp
            .data
            .ok_or_else(|| anyhow::anyhow!("Server returned an empty response"))
    } else {
        let message = resp
            .json::<ApiResponse<()>>()
            .ok()
            .and_then(|r| r.error)
            .unwrap_or_else(|| format!("Server error ({status})"));
        Err(anyhow::anyhow!(message))
    }
}
