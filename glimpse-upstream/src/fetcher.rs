//! Upstream profile fetcher.
//!
//! One GET per lookup, a rotated identity per request, and a single
//! classified outcome. No retries happen here.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use glimpse_core::constants::{
    DEFAULT_UPSTREAM_TIMEOUT_SECONDS, DEFAULT_UPSTREAM_URL, MAX_UPSTREAM_REDIRECTS,
    UPSTREAM_POOL_IDLE_PER_HOST,
};
use glimpse_core::error::{RelayError, Result};
use glimpse_core::traits::ProfileSource;
use glimpse_core::types::UserPayload;

use crate::identity::IdentityRotator;

/// Upstream client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Profile endpoint; the handle is appended as `?username=<handle>`
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_UPSTREAM_URL.into(),
            timeout_seconds: DEFAULT_UPSTREAM_TIMEOUT_SECONDS,
        }
    }
}

impl UpstreamConfig {
    /// Creates config for a custom endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_seconds = timeout.as_secs().max(1);
        self
    }
}

/// HTTP client for the upstream profile endpoint.
pub struct UpstreamFetcher {
    endpoint: Url,
    config: UpstreamConfig,
    rotator: IdentityRotator,
    http_client: reqwest::Client,
}

impl UpstreamFetcher {
    /// Creates a fetcher with the default identity pool.
    pub fn with_config(config: UpstreamConfig) -> Result<Self> {
        Self::with_rotator(config, IdentityRotator::default())
    }

    /// Creates a fetcher with a custom identity pool.
    pub fn with_rotator(config: UpstreamConfig, rotator: IdentityRotator) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            RelayError::Config(format!("invalid upstream endpoint '{}': {}", config.endpoint, e))
        })?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .redirect(reqwest::redirect::Policy::limited(MAX_UPSTREAM_REDIRECTS))
            .pool_max_idle_per_host(UPSTREAM_POOL_IDLE_PER_HOST)
            .build()
            .map_err(|e| RelayError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            config,
            rotator,
            http_client,
        })
    }

    /// The URL requested for `handle`.
    pub fn url_for(&self, handle: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("username", handle);
        url
    }

    /// Fetches and classifies the upstream user object for `handle`.
    #[instrument(skip(self))]
    pub async fn fetch_user(&self, handle: &str) -> Result<UserPayload> {
        let identity = self.rotator.select();
        debug!(identity = identity.label(), "Fetching upstream profile");

        let mut request = self.http_client.get(self.url_for(handle));
        for (name, value) in identity.headers() {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Upstream returned an error status");
            return Err(RelayError::UpstreamStatus {
                code: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(&e))?;

        let document: Value = serde_json::from_slice(&body).map_err(|e| {
            warn!(error = %e, bytes = body.len(), "Upstream body is not JSON");
            RelayError::MalformedResponse(e.to_string())
        })?;

        UserPayload::from_document(document).ok_or_else(|| {
            warn!("Upstream response carries no user object");
            RelayError::RecordNotFound(handle.to_string())
        })
    }

    fn transport_error(&self, err: &reqwest::Error) -> RelayError {
        let detail = if err.is_timeout() {
            format!("timed out after {}s", self.config.timeout_seconds)
        } else {
            err.to_string()
        };
        warn!(error = %detail, "Upstream transport failure");
        RelayError::Transport(detail)
    }
}

#[async_trait]
impl ProfileSource for UpstreamFetcher {
    async fn fetch(&self, handle: &str) -> Result<UserPayload> {
        self.fetch_user(handle).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimpse_core::error::ErrorKind;
    use glimpse_core::types::IdentityProfile;
    use serde_json::json;
    use test_case::test_case;
    use wiremock::matchers::{header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PROFILE_PATH: &str = "/api/v1/users/web_profile_info/";

    fn fetcher_for(server: &MockServer) -> UpstreamFetcher {
        let config = UpstreamConfig::new(format!("{}{}", server.uri(), PROFILE_PATH))
            .with_timeout(Duration::from_secs(1));
        UpstreamFetcher::with_config(config).unwrap()
    }

    async fn serve(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PROFILE_PATH))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let result = UpstreamFetcher::with_config(UpstreamConfig::new("not a url"));
        assert!(matches!(result, Err(RelayError::Config(_))));
    }

    #[test]
    fn test_url_for_encodes_handle() {
        let fetcher =
            UpstreamFetcher::with_config(UpstreamConfig::new("https://upstream.test/profile/"))
                .unwrap();
        assert_eq!(
            fetcher.url_for("alice.b").as_str(),
            "https://upstream.test/profile/?username=alice.b"
        );
        assert_eq!(
            fetcher.url_for("a b&c").as_str(),
            "https://upstream.test/profile/?username=a+b%26c"
        );
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PROFILE_PATH))
            .and(query_param("username", "alice"))
            .and(header_exists("user-agent"))
            .and(header("x-ig-app-id", "936619743392459"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "user": { "username": "alice", "edge_followed_by": { "count": 10 } } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let payload = fetcher_for(&server).fetch_user("alice").await.unwrap();
        assert_eq!(payload.pointer("/username"), Some(&json!("alice")));
        assert_eq!(payload.pointer("/edge_followed_by/count"), Some(&json!(10)));
    }

    #[tokio::test]
    async fn test_fetch_uses_selected_identity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "glimpse-test/1.0"))
            .and(header("accept-language", "nl-NL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "user": { "username": "alice" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let rotator = IdentityRotator::new(vec![IdentityProfile::new(
            "test",
            [("User-Agent", "glimpse-test/1.0"), ("Accept-Language", "nl-NL")],
        )])
        .unwrap();
        let config = UpstreamConfig::new(format!("{}{}", server.uri(), PROFILE_PATH));
        let fetcher = UpstreamFetcher::with_rotator(config, rotator).unwrap();

        assert!(fetcher.fetch_user("alice").await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PROFILE_PATH))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", "/moved/?username=alice"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/moved/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "user": { "username": "alice" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        assert!(fetcher_for(&server).fetch_user("alice").await.is_ok());
    }

    #[test_case(404; "not found")]
    #[test_case(429; "rate limited")]
    #[test_case(500; "server error")]
    #[test_case(401; "login wall")]
    #[tokio::test]
    async fn test_fetch_status_error(code: u16) {
        let server = serve(ResponseTemplate::new(code)).await;
        let err = fetcher_for(&server).fetch_user("alice").await.unwrap_err();
        assert_eq!(err, RelayError::UpstreamStatus { code });
    }

    #[tokio::test]
    async fn test_fetch_non_json_body() {
        let server = serve(
            ResponseTemplate::new(200).set_body_string("<html><body>Log in</body></html>"),
        )
        .await;
        let err = fetcher_for(&server).fetch_user("alice").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[test_case(json!({ "data": {} }); "empty data")]
    #[test_case(json!({ "data": { "user": null } }); "null user")]
    #[test_case(json!({ "status": "ok" }); "no data")]
    #[tokio::test]
    async fn test_fetch_missing_user(body: Value) {
        let server = serve(ResponseTemplate::new(200).set_body_json(body)).await;
        let err = fetcher_for(&server).fetch_user("alice").await.unwrap_err();
        assert_eq!(err, RelayError::RecordNotFound("alice".into()));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Nothing listens on port 1.
        let config = UpstreamConfig::new("http://127.0.0.1:1/profile/");
        let fetcher = UpstreamFetcher::with_config(config).unwrap();
        let err = fetcher.fetch_user("alice").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = serve(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "user": { "username": "alice" } } }))
                .set_delay(Duration::from_secs(3)),
        )
        .await;
        let err = fetcher_for(&server).fetch_user("alice").await.unwrap_err();
        assert_eq!(err, RelayError::Transport("timed out after 1s".into()));
    }
}
