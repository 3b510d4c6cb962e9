//! Access token caching for the upload API.
//!
//! Tokens are minted from the long-lived refresh token and reused until
//! shortly before expiry. A refresh rejected with `invalid_grant` (or any
//! 400/401/403) means the refresh token is dead and maps to
//! [`PublishError::AuthExpired`]; transient failures fall back to a
//! still-usable cached token.

use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::credentials::OAuthCredentials;
use crate::error::{PublishError, PublishResult};

/// Refresh margin: refresh token 60 seconds before expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// TTL assumed when the token endpoint omits `expires_in`.
const TOKEN_DEFAULT_TTL: Duration = Duration::from_secs(50 * 60);

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Refresh-token backed access token cache.
pub struct TokenCache {
    http: Client,
    credentials: OAuthCredentials,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    /// Create a cache, seeded with the document's access token when it is
    /// still valid.
    pub fn new(http: Client, credentials: OAuthCredentials) -> Self {
        let seeded = match (&credentials.access_token, credentials.expiry) {
            (Some(token), Some(expiry)) => (expiry - Utc::now())
                .to_std()
                .ok()
                .map(|ttl| CachedToken {
                    access_token: token.clone(),
                    expires_at: Instant::now() + ttl,
                }),
            _ => None,
        };

        Self {
            http,
            credentials,
            cache: RwLock::new(seeded),
        }
    }

    /// Invalidate the cached token.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_token(&self) -> PublishResult<String> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| c.is_valid()) {
                return Ok(cached.access_token.clone());
            }
        }

        let mut cache = self.cache.write().await;
        if let Some(cached) = cache.as_ref().filter(|c| c.is_valid()) {
            return Ok(cached.access_token.clone());
        }

        match self.refresh().await {
            Ok(fresh) => {
                let token = fresh.access_token.clone();
                *cache = Some(fresh);
                Ok(token)
            }
            Err(e) if e.is_auth_expired() => {
                *cache = None;
                Err(e)
            }
            Err(e) => {
                if let Some(cached) = cache.as_ref().filter(|c| c.is_usable()) {
                    warn!(error = %e, "Token refresh failed, using existing token");
                    return Ok(cached.access_token.clone());
                }
                Err(e)
            }
        }
    }

    async fn refresh(&self) -> PublishResult<CachedToken> {
        debug!(token_uri = %self.credentials.token_uri, "Refreshing access token");

        let response = self
            .http
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", self.credentials.refresh_token.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: TokenErrorResponse = response.json().await.unwrap_or_default();
            let detail = match body.error_description {
                Some(description) => format!("{}: {}", body.error, description),
                None => body.error,
            };

            let rejected = body_is_invalid_grant(&detail)
                || matches!(
                    status,
                    StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
                );
            return Err(if rejected {
                PublishError::auth_expired(format!("token refresh rejected ({}): {}", status, detail))
            } else {
                PublishError::upload_failed(format!("token endpoint returned {}: {}", status, detail))
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PublishError::upload_failed(format!("bad token response: {}", e)))?;

        let ttl = token
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(TOKEN_DEFAULT_TTL);
        info!(ttl_secs = ttl.as_secs(), "Access token refreshed");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + ttl,
        })
    }
}

fn body_is_invalid_grant(detail: &str) -> bool {
    detail.starts_with("invalid_grant")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials(token_uri: String) -> OAuthCredentials {
        OAuthCredentials {
            client_id: "cid".into(),
            client_secret: "secret".into(),
            refresh_token: "rt".into(),
            token_uri,
            access_token: None,
            expiry: None,
        }
    }

    #[test]
    fn test_token_refresh_margin() {
        assert_eq!(TOKEN_REFRESH_MARGIN, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_refresh_and_reuse() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=rt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.fresh",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cache = TokenCache::new(Client::new(), credentials(format!("{}/token", server.uri())));
        assert_eq!(cache.get_token().await.unwrap(), "ya29.fresh");
        assert_eq!(cache.get_token().await.unwrap(), "ya29.fresh");
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "t", "expires_in": 3600})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let cache = TokenCache::new(Client::new(), credentials(format!("{}/token", server.uri())));
        cache.get_token().await.unwrap();
        cache.invalidate().await;
        cache.get_token().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_grant_is_auth_expired() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            })))
            .mount(&server)
            .await;

        let cache = TokenCache::new(Client::new(), credentials(format!("{}/token", server.uri())));
        let err = cache.get_token().await.unwrap_err();
        assert!(err.is_auth_expired());
    }

    #[tokio::test]
    async fn test_server_error_is_not_auth_expired() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let cache = TokenCache::new(Client::new(), credentials(format!("{}/token", server.uri())));
        let err = cache.get_token().await.unwrap_err();
        assert!(matches!(err, PublishError::UploadFailed(_)));
    }

    #[tokio::test]
    async fn test_seeded_token_skips_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let mut creds = credentials(format!("{}/token", server.uri()));
        creds.access_token = Some("seeded".into());
        creds.expiry = Some(Utc::now() + chrono::Duration::minutes(30));

        let cache = TokenCache::new(Client::new(), creds);
        assert_eq!(cache.get_token().await.unwrap(), "seeded");
    }
}
