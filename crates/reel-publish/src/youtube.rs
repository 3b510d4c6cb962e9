//! YouTube Data API resumable upload.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use reel_models::{PrivacyStatus, PublishMetadata, PublishedId, RenderedArtifact};

use crate::credentials::OAuthCredentials;
use crate::error::{PublishError, PublishResult};
use crate::token_cache::TokenCache;

/// Default upload endpoint.
pub const DEFAULT_UPLOAD_URL: &str = "https://www.googleapis.com/upload/youtube/v3/videos";

/// "People & Blogs".
pub const DEFAULT_CATEGORY_ID: &str = "22";

/// Uploads a rendered artifact to the destination platform.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(
        &self,
        artifact: &RenderedArtifact,
        metadata: &PublishMetadata,
    ) -> PublishResult<PublishedId>;
}

#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    pub upload_url: String,
    pub category_id: String,
    pub privacy: PrivacyStatus,
    /// Timeout covering a whole request, including the media transfer
    pub timeout: Duration,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            category_id: DEFAULT_CATEGORY_ID.to_string(),
            privacy: PrivacyStatus::default(),
            timeout: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource<'a> {
    snippet: Snippet<'a>,
    status: Status,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Snippet<'a> {
    title: &'a str,
    description: &'a str,
    tags: &'a [String],
    category_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Status {
    privacy_status: PrivacyStatus,
    self_declared_made_for_kids: bool,
}

#[derive(Debug, Deserialize)]
struct UploadedVideo {
    id: Option<String>,
}

/// Publisher for YouTube via the resumable upload protocol.
pub struct YouTubePublisher {
    http: Client,
    tokens: TokenCache,
    config: YouTubeConfig,
}

impl YouTubePublisher {
    pub fn new(credentials: OAuthCredentials, config: YouTubeConfig) -> PublishResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("reel-publish/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            tokens: TokenCache::new(http.clone(), credentials),
            http,
            config,
        })
    }

    /// Open a resumable upload session.
    async fn start_session(
        &self,
        token: &str,
        metadata: &PublishMetadata,
        size: u64,
    ) -> PublishResult<Response> {
        let resource = VideoResource {
            snippet: Snippet {
                title: &metadata.title,
                description: &metadata.description,
                tags: &metadata.tags,
                category_id: &self.config.category_id,
            },
            status: Status {
                privacy_status: self.config.privacy,
                self_declared_made_for_kids: false,
            },
        };

        let response = self
            .http
            .post(&self.config.upload_url)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(token)
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", size.to_string())
            .json(&resource)
            .send()
            .await
            .map_err(|e| PublishError::upload_failed(format!("session request failed: {}", e)))?;
        Ok(response)
    }

    async fn session_url(&self, metadata: &PublishMetadata, size: u64) -> PublishResult<String> {
        let token = self.tokens.get_token().await?;
        let mut response = self.start_session(&token, metadata, size).await?;

        // A cached token may have been revoked server-side; retry once with a fresh one.
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Upload session rejected access token, refreshing");
            self.tokens.invalidate().await;
            let token = self.tokens.get_token().await?;
            response = self.start_session(&token, metadata, size).await?;
        }

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(PublishError::auth_expired("upload session rejected credentials"));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::upload_failed(format!(
                "session request returned {}: {}",
                status, body
            )));
        }

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| PublishError::upload_failed("session response has no Location header"))
    }
}

#[async_trait]
impl Publisher for YouTubePublisher {
    async fn publish(
        &self,
        artifact: &RenderedArtifact,
        metadata: &PublishMetadata,
    ) -> PublishResult<PublishedId> {
        let bytes = tokio::fs::read(artifact.path()).await?;
        if bytes.is_empty() {
            return Err(PublishError::upload_failed("artifact is empty"));
        }
        let size = bytes.len() as u64;

        info!(
            title = %metadata.title,
            privacy = %self.config.privacy,
            bytes = size,
            "Starting resumable upload"
        );

        let session = self.session_url(metadata, size).await?;

        let response = self
            .http
            .put(&session)
            .header(CONTENT_TYPE, "video/mp4")
            .body(bytes)
            .send()
            .await
            .map_err(|e| PublishError::upload_failed(format!("media transfer failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(PublishError::auth_expired("media transfer rejected credentials"));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::upload_failed(format!(
                "media transfer returned {}: {}",
                status, body
            )));
        }

        let video: UploadedVideo = response
            .json()
            .await
            .map_err(|e| PublishError::upload_failed(format!("bad upload response: {}", e)))?;
        let id = video
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PublishError::upload_failed("upload response has no video id"))?;

        let published = PublishedId::from(id);
        info!(video_id = %published, url = %published.watch_url(), "Upload complete");
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "ya29.t", "expires_in": 3600})),
            )
            .mount(server)
            .await;
    }

    fn publisher(server: &MockServer) -> YouTubePublisher {
        let creds = OAuthCredentials {
            client_id: "cid".into(),
            client_secret: "s".into(),
            refresh_token: "rt".into(),
            token_uri: format!("{}/token", server.uri()),
            access_token: None,
            expiry: None,
        };
        let config = YouTubeConfig {
            upload_url: format!("{}/upload/youtube/v3/videos", server.uri()),
            timeout: Duration::from_secs(5),
            ..Default::default()
        };
        YouTubePublisher::new(creds, config).unwrap()
    }

    fn artifact(dir: &Path) -> RenderedArtifact {
        let file = dir.join("final_short.mp4");
        std::fs::write(&file, vec![0u8; 2048]).unwrap();
        RenderedArtifact::new(file, 12.0)
    }

    fn metadata() -> PublishMetadata {
        PublishMetadata::new("Snow day #shorts", "First snow! #dogs", ["dog", "snow"])
    }

    #[tokio::test]
    async fn test_publish_resumable_flow() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .and(query_param("uploadType", "resumable"))
            .and(query_param("part", "snippet,status"))
            .and(header("authorization", "Bearer ya29.t"))
            .and(header("x-upload-content-length", "2048"))
            .and(body_partial_json(json!({
                "snippet": {"title": "Snow day #shorts", "categoryId": "22", "tags": ["dog", "snow"]},
                "status": {"privacyStatus": "public", "selfDeclaredMadeForKids": false}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Location", format!("{}/session/abc", server.uri()).as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/session/abc"))
            .and(header("content-type", "video/mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "dQw4w9WgXcQ"})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let id = publisher(&server)
            .publish(&artifact(dir.path()), &metadata())
            .await
            .unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn test_revoked_refresh_token_is_auth_expired() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let err = publisher(&server)
            .publish(&artifact(dir.path()), &metadata())
            .await
            .unwrap_err();
        assert!(err.is_auth_expired());
    }

    #[tokio::test]
    async fn test_session_unauthorized_twice_is_auth_expired() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let err = publisher(&server)
            .publish(&artifact(dir.path()), &metadata())
            .await
            .unwrap_err();
        assert!(err.is_auth_expired());
    }

    #[tokio::test]
    async fn test_quota_error_is_upload_failed() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quotaExceeded"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let err = publisher(&server)
            .publish(&artifact(dir.path()), &metadata())
            .await
            .unwrap_err();
        match err {
            PublishError::UploadFailed(msg) => assert!(msg.contains("quotaExceeded")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transfer_failure_is_upload_failed() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Location", format!("{}/session/x", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let err = publisher(&server)
            .publish(&artifact(dir.path()), &metadata())
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::UploadFailed(_)));
    }
}
