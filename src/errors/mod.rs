//! Error types for the Slack client.
//!
//! Maps transport failures, credential problems and Slack's `ok:false`
//! envelopes onto one error hierarchy. The `"ratelimited"` code gets its
//! own variant so the client can cool down and retry without string
//! matching.

use std::time::Duration;
use thiserror::Error;

/// Result type for Slack operations
pub type SlackResult<T> = Result<T, SlackError>;

/// Upstream error code that triggers the cooldown retry
pub const RATE_LIMITED_CODE: &str = "ratelimited";

/// Root error type for the Slack client
#[derive(Error, Debug)]
pub enum SlackError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// No usable credential
    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthenticationError),

    /// Network or transport failure
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Rate limit signal from upstream
    #[error("Rate limit error: {0}")]
    RateLimit(#[from] RateLimitError),

    /// Response could not be decoded
    #[error("Response error: {0}")]
    Response(#[from] ResponseError),

    /// Slack answered `ok:false`
    #[error("API error: {code} - {message}")]
    Api {
        /// Slack error code
        code: String,
        /// Error message
        message: String,
    },

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,
}

impl SlackError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "SLACK_CONFIG",
            Self::Authentication(_) => "SLACK_AUTH",
            Self::Network(_) => "SLACK_NETWORK",
            Self::RateLimit(_) => "SLACK_RATE_LIMIT",
            Self::Response(_) => "SLACK_RESPONSE",
            Self::Api { .. } => "SLACK_API",
            Self::Cancelled => "SLACK_CANCELLED",
        }
    }

    /// Upstream error code, if Slack rejected the call
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            Self::RateLimit(_) => Some(RATE_LIMITED_CODE),
            _ => None,
        }
    }

    /// Whether this is the rate limit signal
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimit(_))
    }

    /// Get retry-after duration if upstream supplied one
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit(RateLimitError::RateLimited { retry_after }) => *retry_after,
            _ => None,
        }
    }

    /// Create an error from a Slack `ok:false` envelope
    pub fn from_slack_error(code: &str, message: Option<&str>) -> Self {
        if code == RATE_LIMITED_CODE {
            return Self::RateLimit(RateLimitError::RateLimited { retry_after: None });
        }

        Self::Api {
            code: code.to_string(),
            message: message.unwrap_or(code).to_string(),
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// A required setting is absent for a service
    #[error("Missing setting '{key}' for service '{service}'")]
    MissingSetting {
        /// Service name
        service: String,
        /// Setting key
        key: String,
    },

    /// Unknown service name
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },
}

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthenticationError {
    /// No token stored for the service
    #[error("Service '{service}' is not authorized")]
    NotAuthorized {
        /// Service name
        service: String,
    },

    /// Token response lacks the token the flow expects
    #[error("Token response has no access token at '{path}'")]
    MissingAccessToken {
        /// Path the flow reads the token from
        path: &'static str,
    },

    /// Token cannot be placed in a header
    #[error("Access token is not a valid header value")]
    InvalidToken,

    /// Callback carries neither a service name nor a routable state
    #[error("Authorization callback does not name a service")]
    UnroutableCallback,
}

/// Rate limit errors
#[derive(Error, Debug)]
pub enum RateLimitError {
    /// Slack answered `ratelimited` or HTTP 429
    #[error("Rate limited")]
    RateLimited {
        /// Retry-After header, when present
        retry_after: Option<Duration>,
    },
}

/// Network errors
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Connection failed
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Error message
        message: String,
    },

    /// Request timeout
    #[error("Request timed out")]
    Timeout,

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_connect() {
            NetworkError::ConnectionFailed {
                message: err.to_string(),
            }
        } else {
            NetworkError::Http(err.to_string())
        }
    }
}

/// Response parsing errors
#[derive(Error, Debug)]
pub enum ResponseError {
    /// JSON deserialization error
    #[error("Deserialization error: {message}")]
    DeserializationError {
        /// Error message
        message: String,
    },

    /// Envelope is not a JSON object
    #[error("Unexpected response: {message}")]
    UnexpectedResponse {
        /// Error message
        message: String,
    },

    /// Missing "ok" field
    #[error("Missing 'ok' field in response")]
    MissingOkField,
}

impl From<serde_json::Error> for ResponseError {
    fn from(err: serde_json::Error) -> Self {
        ResponseError::DeserializationError {
            message: err.to_string(),
        }
    }
}
