//! Token source for the authorized transport.
//!
//! The cached token is handed out while it is valid. Once it expires it is
//! exchanged for a fresh one at the client's token endpoint using the
//! refresh token. Refreshed tokens only live in memory.

use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::credentials::OAuthConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::token::{Token, null_as_default};

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    access_token: String,
    #[serde(default, deserialize_with = "null_as_default")]
    token_type: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug)]
pub struct TokenSource {
    config: OAuthConfig,
    http: Client,
    token: Mutex<Token>,
}

impl TokenSource {
    pub fn new(config: OAuthConfig, token: Token, http: Client) -> Self {
        Self {
            config,
            http,
            token: Mutex::new(token),
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Returns a valid token, refreshing the cached one if needed.
    ///
    /// Holding the lock across the refresh keeps concurrent callers from
    /// refreshing the same token twice.
    pub async fn token(&self) -> ProviderResult<Token> {
        let mut cached = self.token.lock().await;

        if cached.is_valid() {
            return Ok(cached.clone());
        }

        if cached.refresh_token.is_empty() {
            return Err(ProviderError::RefreshTokenMissing);
        }

        debug!(token_url = %self.config.token_url, "Access token expired, refreshing");
        let refreshed = self.refresh(&cached.refresh_token).await?;
        *cached = refreshed.clone();
        info!(expiry = ?refreshed.expiry, "Refreshed OAuth2 access token");

        Ok(refreshed)
    }

    async fn refresh(&self, refresh_token: &str) -> ProviderResult<Token> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let data: RefreshResponse = response.json().await?;
        if data.access_token.is_empty() {
            return Err(ProviderError::MissingAccessToken);
        }

        // Google usually omits the refresh token on refresh
        let refresh_token = data
            .refresh_token
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| refresh_token.to_string());

        let expiry = data
            .expires_in
            .filter(|secs| *secs > 0)
            .map(|secs| Utc::now() + Duration::seconds(secs));

        Ok(Token {
            access_token: data.access_token,
            token_type: data.token_type,
            refresh_token,
            expiry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn config(token_url: String) -> OAuthConfig {
        OAuthConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_url: "http://localhost".to_string(),
            auth_url: "http://localhost/auth".to_string(),
            token_url,
            scopes: vec![],
        }
    }

    fn expired(refresh_token: &str) -> Token {
        Token {
            access_token: "stale".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: refresh_token.to_string(),
            expiry: Some(Utc::now() - Duration::hours(1)),
        }
    }

    #[tokio::test]
    async fn valid_token_is_reused() {
        let token = Token {
            access_token: "fresh".to_string(),
            ..Default::default()
        };
        let source = TokenSource::new(
            config("http://127.0.0.1:9/token".to_string()),
            token.clone(),
            Client::new(),
        );
        assert_eq!(source.token().await.unwrap(), token);
    }

    #[tokio::test]
    async fn expired_token_without_refresh_token_fails() {
        let source = TokenSource::new(
            config("http://127.0.0.1:9/token".to_string()),
            expired(""),
            Client::new(),
        );
        let err = source.token().await.unwrap_err();
        assert!(matches!(err, ProviderError::RefreshTokenMissing));
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "1//refresh".into()),
                Matcher::UrlEncoded("client_id".into(), "client-id".into()),
                Matcher::UrlEncoded("client_secret".into(), "client-secret".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "new-access", "token_type": "Bearer", "expires_in": 3599}"#)
            .expect(1)
            .create_async()
            .await;

        let source = TokenSource::new(
            config(format!("{}/token", server.url())),
            expired("1//refresh"),
            Client::new(),
        );

        let token = source.token().await.unwrap();
        assert_eq!(token.access_token, "new-access");
        assert_eq!(token.refresh_token, "1//refresh");
        assert!(token.expiry.unwrap() > Utc::now() + Duration::minutes(59));

        // Second call is served from the refreshed cache.
        let again = source.token().await.unwrap();
        assert_eq!(again.access_token, "new-access");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rotated_refresh_token_is_kept() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "a", "refresh_token": "1//rotated"}"#)
            .create_async()
            .await;

        let source = TokenSource::new(
            config(format!("{}/token", server.url())),
            expired("1//refresh"),
            Client::new(),
        );

        let token = source.token().await.unwrap();
        assert_eq!(token.refresh_token, "1//rotated");
        assert_eq!(token.expiry, None);
    }

    #[tokio::test]
    async fn endpoint_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error": "invalid_grant"}"#)
            .create_async()
            .await;

        let source = TokenSource::new(
            config(format!("{}/token", server.url())),
            expired("1//revoked"),
            Client::new(),
        );

        match source.token().await.unwrap_err() {
            ProviderError::TokenEndpoint { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("invalid_grant"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn response_without_access_token_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token_type": "Bearer"}"#)
            .create_async()
            .await;

        let source = TokenSource::new(
            config(format!("{}/token", server.url())),
            expired("1//refresh"),
            Client::new(),
        );

        let err = source.token().await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingAccessToken));
    }
}
