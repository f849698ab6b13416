//! Slack Web API client.
//!
//! [`ApiClient`] issues one authenticated GET, decodes the envelope and
//! sits out `ratelimited` answers with a fixed cooldown.

pub mod request;
pub mod response;

pub use request::{ApiRequest, CURSOR_PARAM, LIMIT_PARAM};
pub use response::ApiResponse;

use crate::auth::{AuthManager, CredentialProvider};
use crate::config::ClientConfig;
use crate::errors::{SlackError, SlackResult};
use crate::observability::{redact_headers, redact_url};
use crate::resilience::{with_rate_limit_retry, RateLimitRetryConfig};
use crate::transport::{HttpTransport, TransportRequest};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Authenticated single-call client for one service
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    auth: AuthManager,
    config: Arc<ClientConfig>,
    retry: RateLimitRetryConfig,
}

impl ApiClient {
    /// Create a new client
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<dyn CredentialProvider>,
        config: Arc<ClientConfig>,
    ) -> Self {
        let retry = RateLimitRetryConfig::from(config.as_ref());
        Self {
            transport,
            auth: AuthManager::new(credentials),
            config,
            retry,
        }
    }

    /// Override the rate limit behavior
    pub fn with_retry_config(mut self, retry: RateLimitRetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the full URL for a request
    pub fn build_url(&self, request: &ApiRequest) -> String {
        request.url(self.config.base_url.as_str())
    }

    /// Issue `request`, retrying through rate limits
    pub async fn call(&self, request: &ApiRequest) -> SlackResult<ApiResponse> {
        self.call_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// [`call`](Self::call) that gives up with [`SlackError::Cancelled`]
    /// once `cancel` fires
    #[instrument(skip(self, request, cancel), fields(endpoint = %request.endpoint()))]
    pub async fn call_with_cancellation(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> SlackResult<ApiResponse> {
        let url = self.build_url(request);
        let url = url.as_str();

        with_rate_limit_retry(&self.retry, cancel, move || self.attempt(url, cancel)).await
    }

    async fn attempt(&self, url: &str, cancel: &CancellationToken) -> SlackResult<ApiResponse> {
        if cancel.is_cancelled() {
            return Err(SlackError::Cancelled);
        }

        let headers = self.auth.request_headers().await?;

        debug!(
            url = %redact_url(url),
            headers = %redact_headers(&headers),
            "Sending request"
        );

        let request = TransportRequest::get(url, headers).with_timeout(self.config.timeout);
        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(SlackError::Cancelled),
            body = self.transport.send_json(request) => body?,
        };

        ApiResponse::from_envelope(body)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url.as_str())
            .field("retry", &self.retry)
            .finish()
    }
}
