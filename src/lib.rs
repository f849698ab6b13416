//! Slack Tabulate
//!
//! Credentialed Slack Web API client that turns list responses into
//! tables:
//! - One OAuth flow per named service (classic or v2 user-scope apps)
//! - Cursor pagination with merged responses
//! - Fixed cooldown retry on `ratelimited`
//! - Projection and flattening of nested records into rectangular rows
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use slack_tabulate::{ApiRequest, ServiceRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = slack_tabulate::create_registry_from_env()?;
//!     let workspace = registry.get_or_create("ipdx")?;
//!
//!     if !workspace.has_access().await {
//!         println!("Authorize at {}", workspace.authorization_url()?);
//!         return Ok(());
//!     }
//!
//!     let request = ApiRequest::new("conversations.list").param("types", "public_channel");
//!     let table = workspace.fetch_table(&request, &["channels"], &["id", "name"]).await?;
//!     for row in table.to_rows() {
//!         println!("{:?}", row);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `rustls` - TLS via rustls (default)
//! - `native-tls` - TLS via the platform library

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// Core modules
pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod transport;

// Pagination, services and tables
pub mod pagination;
pub mod registry;
pub mod tabulate;

// Resilience
pub mod resilience;

// Observability
pub mod observability;

// Testing utilities
pub mod fixtures;
pub mod mocks;

// Tests
#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use auth::{AuthorizationCallback, CredentialProvider};
pub use client::{ApiClient, ApiRequest, ApiResponse};
pub use config::{ClientConfig, ClientConfigBuilder, FlowKind, ServiceConfig};
pub use errors::{SlackError, SlackResult};
pub use pagination::{MergedResponse, Paginator};
pub use registry::{AuthorizationOutcome, ServiceHandle, ServiceRegistry};
pub use tabulate::{Cell, Table, TableSink};

/// Default base URL for the Slack Web API
pub const DEFAULT_BASE_URL: &str = "https://slack.com/api";

/// Default base URL for the OAuth consent pages
pub const DEFAULT_OAUTH_BASE_URL: &str = "https://slack.com/oauth";

/// Default timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default wait after a `ratelimited` answer, in seconds
pub const DEFAULT_RATE_LIMIT_COOLDOWN_SECS: u64 = 60;

/// Create a service registry with the given client configuration
pub fn create_registry(config: ClientConfig) -> SlackResult<ServiceRegistry> {
    ServiceRegistry::builder().config(config).build()
}

/// Create a service registry from environment variables
///
/// Reads:
/// - `SLACK_BASE_URL`, `SLACK_OAUTH_BASE_URL` - endpoint overrides
/// - `SLACK_TIMEOUT` - request timeout in seconds
/// - `SLACK_RATE_LIMIT_COOLDOWN` - cooldown in seconds
/// - `SLACK_MAX_RATE_LIMIT_RETRIES` - cap on cooldown retries
/// - `SLACK_REDIRECT_URI` - default OAuth redirect URI
/// - `SLACK_{NAME}_CLIENT_ID`, `SLACK_{NAME}_CLIENT_SECRET`,
///   `SLACK_{NAME}_SCOPE`, `SLACK_{NAME}_USER_SCOPE` - per-service registration
pub fn create_registry_from_env() -> SlackResult<ServiceRegistry> {
    ServiceRegistry::from_env()
}
