//! Mock implementations for testing.
//!
//! Provides a scripted transport and a fixed-token credential provider
//! for London-School TDD.

use crate::auth::{AuthorizationCallback, CredentialProvider};
use crate::errors::{
    AuthenticationError, NetworkError, RateLimitError, ResponseError, SlackError, SlackResult,
};
use crate::transport::{FormRequest, HttpTransport, TransportRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use secrecy::SecretString;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// What the mock transport answers with
#[derive(Debug, Clone)]
enum MockOutcome {
    Body(String),
    Unserializable(String),
    Timeout,
    ConnectionFailed(String),
    HttpRateLimited,
}

/// Mock response configuration
#[derive(Debug, Clone)]
pub struct MockResponse {
    outcome: MockOutcome,
    /// Delay before response
    pub delay_ms: Option<u64>,
}

impl MockResponse {
    fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            delay_ms: None,
        }
    }

    /// Create a successful JSON response
    ///
    /// A value that cannot be serialized answers with a deserialization
    /// error when the response is served.
    pub fn json<T: Serialize>(data: &T) -> Self {
        Self::new(match serde_json::to_string(data) {
            Ok(body) => MockOutcome::Body(body),
            Err(e) => MockOutcome::Unserializable(e.to_string()),
        })
    }

    /// Create a response with raw body
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(MockOutcome::Body(body.into()))
    }

    /// Create a Slack `ok:false` envelope
    pub fn slack_error(error_code: &str) -> Self {
        Self::ok(format!(r#"{{"ok":false,"error":"{}"}}"#, error_code))
    }

    /// Create the `ratelimited` envelope
    pub fn rate_limited() -> Self {
        Self::slack_error(crate::errors::RATE_LIMITED_CODE)
    }

    /// Create an HTTP 429 without a JSON body
    pub fn http_rate_limited() -> Self {
        Self::new(MockOutcome::HttpRateLimited)
    }

    /// Create a transport timeout
    pub fn timeout() -> Self {
        Self::new(MockOutcome::Timeout)
    }

    /// Create a connection failure
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new(MockOutcome::ConnectionFailed(message.into()))
    }

    /// Add delay to response
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = Some(ms);
        self
    }

    async fn into_result(self) -> SlackResult<Value> {
        if let Some(delay) = self.delay_ms {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }

        match self.outcome {
            MockOutcome::Body(body) => serde_json::from_str(&body)
                .map_err(|e| SlackError::Response(ResponseError::from(e))),
            MockOutcome::Unserializable(message) => Err(SlackError::Response(
                ResponseError::DeserializationError { message },
            )),
            MockOutcome::Timeout => Err(SlackError::Network(NetworkError::Timeout)),
            MockOutcome::ConnectionFailed(message) => {
                Err(SlackError::Network(NetworkError::ConnectionFailed { message }))
            }
            MockOutcome::HttpRateLimited => Err(SlackError::RateLimit(
                RateLimitError::RateLimited { retry_after: None },
            )),
        }
    }
}

/// Recorded request for verification
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request URL
    pub url: String,
    /// Request method
    pub method: String,
    /// Form body, `k=v` joined by `&`
    pub body: Option<String>,
    /// Request headers
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Value of a header by lower-case name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Mock HTTP transport for testing
pub struct MockHttpTransport {
    /// Queue of responses to return
    responses: Mutex<VecDeque<MockResponse>>,
    /// Recorded requests
    requests: Mutex<Vec<RecordedRequest>>,
    /// Default response if queue is empty
    default_response: Option<MockResponse>,
}

impl MockHttpTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            default_response: None,
        }
    }

    /// Add a response to the queue
    pub fn add_response(self, response: MockResponse) -> Self {
        self.responses.lock().push_back(response);
        self
    }

    /// Add multiple responses
    pub fn add_responses(self, responses: impl IntoIterator<Item = MockResponse>) -> Self {
        self.responses.lock().extend(responses);
        self
    }

    /// Add a JSON response
    pub fn add_json_response<T: Serialize>(self, data: &T) -> Self {
        self.add_response(MockResponse::json(data))
    }

    /// Set default response when queue is empty
    pub fn with_default_response(mut self, response: MockResponse) -> Self {
        self.default_response = Some(response);
        self
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Get the last recorded request
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().last().cloned()
    }

    /// Get remaining response count
    pub fn remaining_responses(&self) -> usize {
        self.responses.lock().len()
    }

    fn record_request(
        &self,
        url: &str,
        method: &str,
        body: Option<String>,
        headers: &http::HeaderMap,
    ) {
        let headers = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        self.requests.lock().push(RecordedRequest {
            url: url.to_string(),
            method: method.to_string(),
            body,
            headers,
        });
    }

    fn next_response(&self) -> SlackResult<MockResponse> {
        self.responses
            .lock()
            .pop_front()
            .or_else(|| self.default_response.clone())
            .ok_or_else(|| {
                SlackError::Response(ResponseError::UnexpectedResponse {
                    message: "No mock response configured".to_string(),
                })
            })
    }
}

impl Default for MockHttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send_json(&self, request: TransportRequest) -> SlackResult<Value> {
        self.record_request(&request.url, request.method.as_str(), None, &request.headers);
        self.next_response()?.into_result().await
    }

    async fn send_form(&self, request: FormRequest) -> SlackResult<Value> {
        let body = request
            .fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        self.record_request(
            &request.url,
            request.method.as_str(),
            Some(body),
            &request.headers,
        );
        self.next_response()?.into_result().await
    }
}

impl std::fmt::Debug for MockHttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHttpTransport")
            .field("pending_responses", &self.responses.lock().len())
            .field("recorded_requests", &self.requests.lock().len())
            .finish()
    }
}

/// Credential provider with a fixed, resettable token
#[derive(Debug, Default)]
pub struct MockCredentialProvider {
    token: Mutex<Option<String>>,
    token_requests: AtomicUsize,
}

impl MockCredentialProvider {
    /// Provider that always hands out `token`
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
            token_requests: AtomicUsize::new(0),
        }
    }

    /// Provider with no credential
    pub fn unauthorized() -> Self {
        Self::default()
    }

    /// How often `access_token` was asked for
    pub fn token_requests(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialProvider for MockCredentialProvider {
    async fn access_token(&self) -> SlackResult<SecretString> {
        self.token_requests.fetch_add(1, Ordering::SeqCst);
        self.token
            .lock()
            .clone()
            .map(SecretString::new)
            .ok_or_else(|| {
                SlackError::Authentication(AuthenticationError::NotAuthorized {
                    service: "mock".to_string(),
                })
            })
    }

    fn authorization_url(&self) -> SlackResult<String> {
        Ok("https://slack.com/oauth/v2/authorize?client_id=mock".to_string())
    }

    async fn handle_authorization_callback(
        &self,
        callback: &AuthorizationCallback,
    ) -> SlackResult<bool> {
        match &callback.code {
            Some(code) if callback.error.is_none() => {
                *self.token.lock() = Some(format!("xoxp-{}", code));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reset(&self) -> SlackResult<()> {
        *self.token.lock() = None;
        Ok(())
    }

    async fn has_access(&self) -> bool {
        self.token.lock().is_some()
    }
}

/// Build a shared mock transport from a list of responses
pub fn scripted_transport(responses: impl IntoIterator<Item = MockResponse>) -> Arc<MockHttpTransport> {
    Arc::new(MockHttpTransport::new().add_responses(responses))
}
