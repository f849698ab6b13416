//! HTTP transport layer for the Slack client.
//!
//! Moves bytes to and from Slack and decodes the body as JSON. Envelope
//! interpretation (`ok` / `error`) happens one layer up so the OAuth
//! token exchange and the Web API calls share it.

use crate::errors::{NetworkError, RateLimitError, ResponseError, SlackError, SlackResult};
use async_trait::async_trait;
use http::{HeaderMap, Method, StatusCode};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, ClientBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Characters left unescaped by JavaScript's `encodeURIComponent`
const URI_COMPONENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a query key or value
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT_SET).to_string()
}

/// Append `key=value` pairs to a URL, `?` first then `&`
pub fn append_query<K, V>(url: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut url = url.to_string();
    let mut separator = if url.contains('?') { '&' } else { '?' };
    for (key, value) in params {
        url.push(separator);
        url.push_str(&encode_uri_component(key.as_ref()));
        url.push('=');
        url.push_str(&encode_uri_component(value.as_ref()));
        separator = '&';
    }
    url
}

/// HTTP transport trait for making API requests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and decode the JSON body
    async fn send_json(&self, request: TransportRequest) -> SlackResult<Value>;

    /// Send a form-encoded request and decode the JSON body
    async fn send_form(&self, request: FormRequest) -> SlackResult<Value>;
}

/// Transport request without a body
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Full URL including query string
    pub url: String,
    /// Request headers
    pub headers: HeaderMap,
    /// Request timeout
    pub timeout: Option<Duration>,
}

impl TransportRequest {
    /// Create a new GET request
    pub fn get(url: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers,
            timeout: None,
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Form-encoded request
#[derive(Debug, Clone)]
pub struct FormRequest {
    /// HTTP method
    pub method: Method,
    /// URL
    pub url: String,
    /// Request headers
    pub headers: HeaderMap,
    /// Form fields
    pub fields: Vec<(String, String)>,
    /// Request timeout
    pub timeout: Option<Duration>,
}

impl FormRequest {
    /// Create a new form POST request
    pub fn post(url: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers,
            fields: Vec::new(),
            timeout: None,
        }
    }

    /// Add a form field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Default HTTP transport implementation using reqwest
pub struct ReqwestTransport {
    client: Client,
    default_timeout: Duration,
}

impl ReqwestTransport {
    /// Create a new transport with the given timeout
    pub fn new(timeout: Duration) -> SlackResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| SlackError::Network(NetworkError::Http(e.to_string())))?;

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Create a new transport with a pre-built client
    pub fn with_client(client: Client, default_timeout: Duration) -> Self {
        Self {
            client,
            default_timeout,
        }
    }

    /// Decode the body; a 429 without a JSON envelope becomes a rate limit
    async fn parse_response(&self, response: Response) -> SlackResult<Value> {
        let status = response.status();
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);

        let body = response
            .text()
            .await
            .map_err(|e| SlackError::Network(NetworkError::from(e)))?;

        debug!(status = %status, body_len = body.len(), "Received response");

        match serde_json::from_str::<Value>(&body) {
            Ok(json) => Ok(json),
            Err(_) if status == StatusCode::TOO_MANY_REQUESTS => {
                Err(SlackError::RateLimit(RateLimitError::RateLimited { retry_after }))
            }
            Err(e) => {
                if !status.is_success() {
                    warn!(status = %status, "Request failed with non-success status");
                    return Err(SlackError::Network(NetworkError::Http(format!(
                        "HTTP {}",
                        status
                    ))));
                }
                Err(SlackError::Response(ResponseError::from(e)))
            }
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method))]
    async fn send_json(&self, request: TransportRequest) -> SlackResult<Value> {
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        let response = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| SlackError::Network(NetworkError::from(e)))?;

        self.parse_response(response).await
    }

    #[instrument(skip(self, request), fields(method = %request.method))]
    async fn send_form(&self, request: FormRequest) -> SlackResult<Value> {
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        let response = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers)
            .form(&request.fields)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| SlackError::Network(NetworkError::from(e)))?;

        self.parse_response(response).await
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test_case("C123", "C123" ; "plain")]
    #[test_case("a b", "a%20b" ; "space")]
    #[test_case("a&b=c", "a%26b%3Dc" ; "reserved")]
    #[test_case("-_.!~*'()", "-_.!~*'()" ; "unreserved marks")]
    #[test_case("dGVhbTpD+/=", "dGVhbTpD%2B%2F%3D" ; "base64 cursor")]
    #[test_case("é", "%C3%A9" ; "utf8")]
    fn test_encode_uri_component(input: &str, expected: &str) {
        assert_eq!(encode_uri_component(input), expected);
    }

    #[test]
    fn test_append_query_order() {
        let url = append_query(
            "https://slack.com/api/conversations.history",
            &[("cursor", "abc="), ("channel", "C1"), ("limit", "10")],
        );
        assert_eq!(
            url,
            "https://slack.com/api/conversations.history?cursor=abc%3D&channel=C1&limit=10"
        );

        let empty: [(&str, &str); 0] = [];
        assert_eq!(append_query("https://x/y", &empty), "https://x/y");
    }

    #[test]
    fn test_form_request_builder() {
        let request = FormRequest::post("https://slack.com/api/oauth.access", HeaderMap::new())
            .field("code", "abc")
            .field("client_id", "123");

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.fields.len(), 2);
        assert_eq!(request.fields[0], ("code".to_string(), "abc".to_string()));
    }

    #[tokio::test]
    async fn test_reqwest_transport_decodes_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth.test"))
            .and(query_param("team", "T1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true,"team":"T1"}"#))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let url = format!("{}/api/auth.test?team=T1", server.uri());
        let body = transport
            .send_json(TransportRequest::get(url, HeaderMap::new()))
            .await
            .unwrap();

        assert_eq!(body["team"], "T1");
    }

    #[tokio::test]
    async fn test_reqwest_transport_429_without_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("Retry-After", "30")
                    .set_body_string("slow down"),
            )
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let err = transport
            .send_json(TransportRequest::get(server.uri(), HeaderMap::new()))
            .await
            .unwrap_err();

        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_reqwest_transport_non_json_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let err = transport
            .send_json(TransportRequest::get(server.uri(), HeaderMap::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, SlackError::Network(NetworkError::Http(_))));
    }
}
