//! Configuration management for the Slack client.
//!
//! Two layers:
//! - [`ClientConfig`]: process-wide settings (endpoints, timeouts, cooldown)
//! - [`ServiceConfig`]: per-service OAuth registration, produced by a
//!   [`ConfigResolver`] for a service name

use crate::errors::{ConfigurationError, SlackError, SlackResult};
use secrecy::SecretString;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Literal value stored by spreadsheet property editors for "empty"
const QUOTED_EMPTY: &str = "\"\"";

/// Which OAuth variant a service registration uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    /// Legacy flow, token at the top level of the token response
    Classic,
    /// Modern user-scope flow, token under `authed_user`
    Standard,
}

/// OAuth registration for one named service
#[derive(Clone)]
pub struct ServiceConfig {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
    /// Comma-separated bot/classic scopes
    pub scope: String,
    /// Comma-separated user scopes; presence selects the standard flow
    pub user_scope: Option<String>,
    /// Redirect URI registered with Slack
    pub redirect_uri: Option<String>,
}

impl ServiceConfig {
    /// Create a classic registration
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            scope: String::new(),
            user_scope: None,
            redirect_uri: None,
        }
    }

    /// Set the scope
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Set the user scope (selects the standard flow)
    pub fn with_user_scope(mut self, user_scope: impl Into<String>) -> Self {
        self.user_scope = Some(user_scope.into());
        self
    }

    /// Set the redirect URI
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Flow kind implied by this registration
    pub fn flow_kind(&self) -> FlowKind {
        if self.user_scope.is_some() {
            FlowKind::Standard
        } else {
            FlowKind::Classic
        }
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("user_scope", &self.user_scope)
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Resolves the OAuth registration for a service name
pub trait ConfigResolver: Send + Sync {
    /// Look up the registration for `name`
    fn resolve(&self, name: &str) -> SlackResult<ServiceConfig>;
}

fn normalize(value: String) -> String {
    if value == QUOTED_EMPTY {
        String::new()
    } else {
        value
    }
}

fn missing(service: &str, key: impl Into<String>) -> SlackError {
    SlackError::Configuration(ConfigurationError::MissingSetting {
        service: service.to_string(),
        key: key.into(),
    })
}

/// Resolver over a flat property map using `{name}.id`, `{name}.secret`,
/// `{name}.scope`, `{name}.userScope` and `{name}.redirectUri` keys
#[derive(Debug, Clone, Default)]
pub struct PropertyConfigResolver {
    properties: HashMap<String, String>,
}

impl PropertyConfigResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    fn get(&self, name: &str, suffix: &str) -> Option<String> {
        self.properties
            .get(&format!("{}.{}", name, suffix))
            .cloned()
            .map(normalize)
    }
}

impl FromIterator<(String, String)> for PropertyConfigResolver {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            properties: iter.into_iter().collect(),
        }
    }
}

impl ConfigResolver for PropertyConfigResolver {
    fn resolve(&self, name: &str) -> SlackResult<ServiceConfig> {
        let client_id = self
            .get(name, "id")
            .ok_or_else(|| missing(name, format!("{}.id", name)))?;
        let client_secret = self
            .get(name, "secret")
            .ok_or_else(|| missing(name, format!("{}.secret", name)))?;

        Ok(ServiceConfig {
            client_id,
            client_secret: SecretString::new(client_secret),
            scope: self.get(name, "scope").unwrap_or_default(),
            user_scope: self.get(name, "userScope"),
            redirect_uri: self.get(name, "redirectUri"),
        })
    }
}

/// Resolver reading `SLACK_{NAME}_*` environment variables
///
/// The name is upper-cased with `-` and `.` mapped to `_`, so service
/// `ipdx-classic` reads `SLACK_IPDX_CLASSIC_CLIENT_ID`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfigResolver;

impl EnvConfigResolver {
    fn var_name(name: &str, suffix: &str) -> String {
        let name: String = name
            .chars()
            .map(|c| match c {
                '-' | '.' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        format!("SLACK_{}_{}", name, suffix)
    }

    fn get(name: &str, suffix: &str) -> Option<String> {
        std::env::var(Self::var_name(name, suffix)).ok().map(normalize)
    }
}

impl ConfigResolver for EnvConfigResolver {
    fn resolve(&self, name: &str) -> SlackResult<ServiceConfig> {
        let client_id = Self::get(name, "CLIENT_ID")
            .ok_or_else(|| missing(name, Self::var_name(name, "CLIENT_ID")))?;
        let client_secret = Self::get(name, "CLIENT_SECRET")
            .ok_or_else(|| missing(name, Self::var_name(name, "CLIENT_SECRET")))?;

        Ok(ServiceConfig {
            client_id,
            client_secret: SecretString::new(client_secret),
            scope: Self::get(name, "SCOPE").unwrap_or_default(),
            user_scope: Self::get(name, "USER_SCOPE"),
            redirect_uri: Self::get(name, "REDIRECT_URI"),
        })
    }
}

/// Process-wide client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for Web API requests
    pub base_url: Url,
    /// Base URL for the OAuth consent pages
    pub oauth_base_url: Url,
    /// Request timeout
    pub timeout: Duration,
    /// Fixed wait after a `ratelimited` answer
    pub rate_limit_cooldown: Duration,
    /// Cap on cooldown retries per call; `None` retries forever
    pub max_rate_limit_retries: Option<u32>,
    /// Default redirect URI for services that do not set one
    pub redirect_uri: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(crate::DEFAULT_BASE_URL).expect("default base URL is valid"),
            oauth_base_url: Url::parse(crate::DEFAULT_OAUTH_BASE_URL)
                .expect("default OAuth URL is valid"),
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT_SECS),
            rate_limit_cooldown: Duration::from_secs(crate::DEFAULT_RATE_LIMIT_COOLDOWN_SECS),
            max_rate_limit_retries: None,
            redirect_uri: None,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Create configuration from environment variables
    pub fn from_env() -> SlackResult<Self> {
        let mut builder = ClientConfigBuilder::new();

        if let Ok(url) = std::env::var("SLACK_BASE_URL") {
            builder = builder.base_url(&url)?;
        }

        if let Ok(url) = std::env::var("SLACK_OAUTH_BASE_URL") {
            builder = builder.oauth_base_url(&url)?;
        }

        if let Ok(timeout) = std::env::var("SLACK_TIMEOUT") {
            if let Ok(secs) = timeout.parse::<u64>() {
                builder = builder.timeout(Duration::from_secs(secs));
            }
        }

        if let Ok(cooldown) = std::env::var("SLACK_RATE_LIMIT_COOLDOWN") {
            if let Ok(secs) = cooldown.parse::<u64>() {
                builder = builder.rate_limit_cooldown(Duration::from_secs(secs));
            }
        }

        if let Ok(retries) = std::env::var("SLACK_MAX_RATE_LIMIT_RETRIES") {
            if let Ok(n) = retries.parse::<u32>() {
                builder = builder.max_rate_limit_retries(n);
            }
        }

        if let Ok(uri) = std::env::var("SLACK_REDIRECT_URI") {
            builder = builder.redirect_uri(&uri);
        }

        Ok(builder.build())
    }

    /// Build the full URL for a Web API endpoint
    pub fn build_url(&self, endpoint: &str) -> String {
        join(&self.base_url, endpoint)
    }

    /// Build the full URL for an OAuth consent path
    pub fn build_oauth_url(&self, path: &str) -> String {
        join(&self.oauth_base_url, path)
    }
}

fn join(base: &Url, path: &str) -> String {
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Set the Web API base URL
    pub fn base_url(mut self, url: &str) -> Result<Self, ConfigurationError> {
        self.config.base_url = parse_url(url)?;
        Ok(self)
    }

    /// Set the OAuth base URL
    pub fn oauth_base_url(mut self, url: &str) -> Result<Self, ConfigurationError> {
        self.config.oauth_base_url = parse_url(url)?;
        Ok(self)
    }

    /// Set the timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the rate limit cooldown
    pub fn rate_limit_cooldown(mut self, cooldown: Duration) -> Self {
        self.config.rate_limit_cooldown = cooldown;
        self
    }

    /// Cap the number of cooldown retries
    pub fn max_rate_limit_retries(mut self, retries: u32) -> Self {
        self.config.max_rate_limit_retries = Some(retries);
        self
    }

    /// Set the default redirect URI
    pub fn redirect_uri(mut self, uri: &str) -> Self {
        self.config.redirect_uri = Some(uri.to_string());
        self
    }

    /// Build the configuration
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

fn parse_url(url: &str) -> Result<Url, ConfigurationError> {
    Url::parse(url).map_err(|e| ConfigurationError::InvalidConfiguration {
        message: format!("Invalid URL: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_config_builder() {
        let config = ClientConfigBuilder::new()
            .timeout(Duration::from_secs(60))
            .rate_limit_cooldown(Duration::from_secs(5))
            .max_rate_limit_retries(2)
            .build();

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.rate_limit_cooldown, Duration::from_secs(5));
        assert_eq!(config.max_rate_limit_retries, Some(2));
    }

    #[test]
    fn test_default_cooldown_is_one_minute() {
        let config = ClientConfig::default();
        assert_eq!(config.rate_limit_cooldown, Duration::from_secs(60));
        assert_eq!(config.max_rate_limit_retries, None);
    }

    #[test]
    fn test_build_url() {
        let config = ClientConfig::default();

        assert_eq!(
            config.build_url("/conversations.list"),
            "https://slack.com/api/conversations.list"
        );
        assert_eq!(
            config.build_oauth_url("v2/authorize"),
            "https://slack.com/oauth/v2/authorize"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ClientConfigBuilder::new().base_url("not a url").is_err());
    }

    #[test]
    fn test_property_resolver_classic() {
        let resolver = PropertyConfigResolver::new()
            .property("ipdx.id", "123.456")
            .property("ipdx.secret", "shh")
            .property("ipdx.scope", "channels:read");

        let config = resolver.resolve("ipdx").unwrap();
        assert_eq!(config.client_id, "123.456");
        assert_eq!(config.client_secret.expose_secret(), "shh");
        assert_eq!(config.scope, "channels:read");
        assert_eq!(config.flow_kind(), FlowKind::Classic);
    }

    #[test]
    fn test_property_resolver_quoted_empty_user_scope_is_standard() {
        let resolver = PropertyConfigResolver::new()
            .property("ipdx.id", "1")
            .property("ipdx.secret", "2")
            .property("ipdx.scope", "\"\"")
            .property("ipdx.userScope", "\"\"");

        let config = resolver.resolve("ipdx").unwrap();
        assert_eq!(config.scope, "");
        assert_eq!(config.user_scope.as_deref(), Some(""));
        assert_eq!(config.flow_kind(), FlowKind::Standard);
    }

    #[test]
    fn test_property_resolver_missing_secret() {
        let resolver = PropertyConfigResolver::new().property("ipdx.id", "1");

        let err = resolver.resolve("ipdx").unwrap_err();
        assert!(matches!(
            err,
            SlackError::Configuration(ConfigurationError::MissingSetting { ref key, .. }) if key == "ipdx.secret"
        ));
    }

    #[test]
    fn test_env_resolver() {
        std::env::set_var("SLACK_ENV_TEST_WS_CLIENT_ID", "id-1");
        std::env::set_var("SLACK_ENV_TEST_WS_CLIENT_SECRET", "secret-1");
        std::env::set_var("SLACK_ENV_TEST_WS_USER_SCOPE", "search:read");

        let config = EnvConfigResolver.resolve("env-test.ws").unwrap();
        assert_eq!(config.client_id, "id-1");
        assert_eq!(config.user_scope.as_deref(), Some("search:read"));
        assert_eq!(config.flow_kind(), FlowKind::Standard);

        assert!(EnvConfigResolver.resolve("env-test-absent").is_err());
    }

    #[test]
    fn test_service_config_debug_redacts_secret() {
        let config = ServiceConfig::new("id", "very-secret");
        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("very-secret"));
    }
}
