//! Feed service HTTP client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use reel_models::{Candidate, CandidatePool};

use crate::download::download_media;
use crate::error::{SourceError, SourceResult};
use crate::source::CandidateSource;
use crate::types::{PopularityMetric, PostRecord, PostsResponse};

/// Default cap on video candidates per pool.
pub const DEFAULT_POOL_SIZE: usize = 15;

/// Feed client configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Base URL of the feed service
    pub base_url: String,
    /// Bearer credential
    pub token: String,
    /// Maximum number of video candidates kept per pool
    pub pool_size: usize,
    /// Number of posts requested per fetch (videos and non-videos)
    pub page_size: usize,
    /// Counter used as the popularity metric
    pub metric: PopularityMetric,
    /// Timeout for feed requests
    pub timeout: Duration,
    /// Timeout for media downloads
    pub download_timeout: Duration,
}

impl FeedConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            pool_size: DEFAULT_POOL_SIZE,
            page_size: 50,
            metric: PopularityMetric::default(),
            timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(300),
        }
    }
}

/// HTTP client for the post feed service.
pub struct FeedClient {
    http: Client,
    download_http: Client,
    config: FeedConfig,
}

impl FeedClient {
    /// Create a new feed client.
    pub fn new(config: FeedConfig) -> SourceResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("reel-source/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SourceError::Network)?;

        let download_http = Client::builder()
            .timeout(config.download_timeout)
            .user_agent(concat!("reel-source/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SourceError::Network)?;

        Ok(Self {
            http,
            download_http,
            config,
        })
    }

    fn posts_url(&self, channel: &str) -> String {
        format!(
            "{}/channels/{}/posts",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(channel)
        )
    }

    /// Keep video posts in feed order, capped at the pool size.
    ///
    /// Records that do not parse are dropped like non-video posts.
    fn build_pool(&self, channel: &str, response: PostsResponse) -> SourceResult<CandidatePool> {
        let total = response.posts.len();
        let candidates: Vec<Candidate> = response
            .posts
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<PostRecord>(value) {
                Ok(post) => Some(post),
                Err(e) => {
                    debug!(channel, error = %e, "Skipping malformed post record");
                    None
                }
            })
            .filter_map(|post| post.into_candidate(self.config.metric))
            .take(self.config.pool_size)
            .collect();

        debug!(
            channel,
            posts = total,
            videos = candidates.len(),
            "Filtered feed to video candidates"
        );

        if candidates.is_empty() {
            return Err(SourceError::empty_pool(channel));
        }
        Ok(CandidatePool::new(channel, candidates))
    }
}

#[async_trait]
impl CandidateSource for FeedClient {
    async fn fetch(&self, channel: &str) -> SourceResult<CandidatePool> {
        let url = self.posts_url(channel);
        info!(channel, "Fetching candidate pool");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.token)
            .query(&[("limit", self.config.page_size.to_string())])
            .send()
            .await
            .map_err(|e| SourceError::unavailable(format!("feed request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SourceError::Unauthorized(format!(
                "feed returned {} for channel {}",
                status, channel
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::unavailable(format!(
                "feed returned {}: {}",
                status, body
            )));
        }

        let parsed: PostsResponse = response
            .json()
            .await
            .map_err(|e| SourceError::InvalidResponse(format!("failed to parse feed: {}", e)))?;

        let pool = self.build_pool(channel, parsed)?;
        info!(channel, candidates = pool.len(), "Fetched candidate pool");
        Ok(pool)
    }

    async fn download(&self, candidate: &Candidate, dir: &Path) -> SourceResult<PathBuf> {
        download_media(&self.download_http, &candidate.media_url, dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> FeedClient {
        let mut config = FeedConfig::new(server.uri(), "feed-token");
        config.timeout = Duration::from_secs(2);
        FeedClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_filters_non_video() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/our.littlejoys/posts"))
            .and(query_param("limit", "50"))
            .and(header("authorization", "Bearer feed-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "posts": [
                    {"shortcode": "A", "media_type": "video", "video_url": "https://cdn/a.mp4", "play_count": 30000, "caption": " so cute "},
                    {"shortcode": "P", "media_type": "image"},
                    {"shortcode": "B", "media_type": "video", "video_url": "https://cdn/b.mp4"}
                ]
            })))
            .mount(&server)
            .await;

        let pool = client_for(&server).fetch("our.littlejoys").await.unwrap();
        assert_eq!(pool.channel, "our.littlejoys");
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.candidates[0].id.as_str(), "A");
        assert_eq!(pool.candidates[0].popularity, 30000);
        assert_eq!(pool.candidates[0].caption, "so cute");
        assert_eq!(pool.candidates[1].popularity, 0);
    }

    #[tokio::test]
    async fn test_fetch_caps_pool_size() {
        let server = MockServer::start().await;
        let posts: Vec<_> = (0..40)
            .map(|i| json!({"shortcode": format!("V{}", i), "is_video": true, "video_url": "u"}))
            .collect();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "posts": posts })))
            .mount(&server)
            .await;

        let pool = client_for(&server).fetch("chan").await.unwrap();
        assert_eq!(pool.len(), DEFAULT_POOL_SIZE);
    }

    #[tokio::test]
    async fn test_fetch_skips_malformed_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "posts": [
                    {"id": "3301", "shortcode": "DAbc", "media_type": "video", "video_url": "https://cdn/a.mp4", "play_count": 42},
                    {"id": 3302, "media_type": "video", "video_url": "https://cdn/b.mp4"},
                    {"shortcode": "BAD", "media_type": "video", "video_url": "https://cdn/c.mp4", "play_count": "many"},
                    "not an object",
                    {"code": "C9", "is_video": true, "video_url": "https://cdn/d.mp4", "caption": null}
                ]
            })))
            .mount(&server)
            .await;

        let pool = client_for(&server).fetch("chan").await.unwrap();
        let ids: Vec<&str> = pool.candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["DAbc", "3302", "C9"]);
        assert_eq!(pool.candidates[0].popularity, 42);
    }

    #[tokio::test]
    async fn test_fetch_without_videos_is_empty_pool() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "posts": [{"shortcode": "P", "media_type": "image"}]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch("chan").await.unwrap_err();
        assert!(err.is_empty_pool());
    }

    #[tokio::test]
    async fn test_fetch_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch("chan").await.unwrap_err();
        assert!(matches!(err, SourceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch("chan").await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
    }
}
