//! Authentication management for the Slack client.
//!
//! The client only ever asks for a bearer token; how that token is
//! obtained (OAuth consent, code exchange, storage) sits behind
//! [`CredentialProvider`].

pub mod flow;
pub mod provider;
pub mod storage;

pub use flow::{ClassicFlow, FlowStrategy, StandardFlow};
pub use provider::OAuthCredentialProvider;
pub use storage::{token_key, InMemoryTokenStore, StoredToken, TokenStore};

use crate::errors::{AuthenticationError, SlackError, SlackResult};
use async_trait::async_trait;
use http::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

/// Content type Slack expects on Web API GETs
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Source of bearer tokens for one named service
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current access token, or an authentication error
    async fn access_token(&self) -> SlackResult<SecretString>;

    /// URL the user visits to grant access
    fn authorization_url(&self) -> SlackResult<String>;

    /// Complete the consent flow; `false` when the user denied or the
    /// callback does not belong to a pending authorization
    async fn handle_authorization_callback(
        &self,
        callback: &AuthorizationCallback,
    ) -> SlackResult<bool>;

    /// Forget the stored credential
    async fn reset(&self) -> SlackResult<()>;

    /// Whether a credential is stored, without calling Slack
    async fn has_access(&self) -> bool;
}

/// Parameters Slack appends to the redirect URI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationCallback {
    /// Target service, when carried explicitly
    pub service_name: Option<String>,
    /// Authorization code
    pub code: Option<String>,
    /// State issued with the authorization URL
    pub state: Option<String>,
    /// Error reported by Slack (e.g. `access_denied`)
    pub error: Option<String>,
}

impl AuthorizationCallback {
    /// Parse a callback query string (with or without the leading `?`)
    pub fn from_query(query: &str) -> Self {
        let mut callback = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let value = value.into_owned();
            match key.as_ref() {
                "code" => callback.code = Some(value),
                "state" => callback.state = Some(value),
                "error" => callback.error = Some(value),
                "serviceName" | "service_name" => callback.service_name = Some(value),
                _ => {}
            }
        }
        callback
    }

    /// Service this callback is addressed to: the explicit name, else the
    /// prefix of the state issued by [`OAuthCredentialProvider`]
    pub fn service(&self) -> Option<&str> {
        self.service_name.as_deref().or_else(|| {
            self.state
                .as_deref()
                .and_then(|state| state.rsplit_once(':'))
                .map(|(service, _)| service)
        })
    }
}

/// Builds authenticated headers for Web API requests
#[derive(Clone)]
pub struct AuthManager {
    credentials: Arc<dyn CredentialProvider>,
}

impl AuthManager {
    /// Create a new authentication manager
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { credentials }
    }

    /// The wrapped credential provider
    pub fn credentials(&self) -> &Arc<dyn CredentialProvider> {
        &self.credentials
    }

    /// Headers for one request; the token is fetched fresh every time
    pub async fn request_headers(&self) -> SlackResult<HeaderMap> {
        let token = self.credentials.access_token().await?;
        build_headers(&token)
    }
}

fn build_headers(token: &SecretString) -> SlackResult<HeaderMap> {
    let mut headers = HeaderMap::new();

    let auth_value = format!("Bearer {}", token.expose_secret());
    let mut auth_value = HeaderValue::from_str(&auth_value)
        .map_err(|_| SlackError::Authentication(AuthenticationError::InvalidToken))?;
    auth_value.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth_value);

    headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));

    Ok(headers)
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager").finish_non_exhaustive()
    }
}
