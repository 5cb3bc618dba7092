use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Body returned by the map token endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl TokenResponse {
    /// A response only counts when it carries a non-empty token.
    pub fn into_token(self) -> Result<String> {
        match self.token {
            Some(token) if !token.trim().is_empty() => Ok(token),
            Some(_) => Err(Error::TokenUnavailable("token endpoint returned an empty token".into())),
            None => Err(Error::TokenUnavailable("token endpoint returned no token".into())),
        }
    }
}

/// Something that can hand out a map access token.
pub trait MapTokenSource {
    fn fetch_token(&self) -> Result<String>;
}

impl<F> MapTokenSource for F
where
    F: Fn() -> Result<String>,
{
    fn fetch_token(&self) -> Result<String> {
        self()
    }
}

/// A token known up front, typically from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenSource {
    token: Option<String>,
}

impl StaticTokenSource {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

impl MapTokenSource for StaticTokenSource {
    fn fetch_token(&self) -> Result<String> {
        TokenResponse {
            token: self.token.clone(),
        }
        .into_token()
    }
}

/// Fetches the token from a running server's `/api/v1/map/token` endpoint.
#[cfg(feature = "cli")]
pub struct HttpTokenSource {
    client: reqwest::blocking::Client,
    url: String,
}

#[cfg(feature = "cli")]
impl HttpTokenSource {
    pub fn new(server_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            url: format!("{}/api/v1/map/token", server_url.trim_end_matches('/')),
        })
    }
}

#[cfg(feature = "cli")]
impl MapTokenSource for HttpTokenSource {
    fn fetch_token(&self) -> Result<String> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| Error::TokenUnavailable(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(Error::TokenUnavailable(format!(
                "token endpoint returned {}",
                resp.status()
            )));
        }

        resp.json::<TokenResponse>()
            .map_err(|e| Error::TokenUnavailable(format!("malformed token response: {e}")))?
            .into_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_field_is_unavailable() {
        let resp: TokenResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(resp.into_token(), Err(Error::TokenUnavailable(_))));
    }

    #[test]
    fn test_empty_token_is_unavailable() {
        let resp: TokenResponse = serde_json::from_str(r#"{"token": "  "}"#).unwrap();
        assert!(matches!(resp.into_token(), Err(Error::TokenUnavailable(_))));
    }

    #[test]
    fn test_static_source() {
        let source = StaticTokenSource::new(Some("pk.abc".to_string()));
        assert_eq!(source.fetch_token().unwrap(), "pk.abc");
        assert!(StaticTokenSource::new(None).fetch_token().is_err());
    }
}
