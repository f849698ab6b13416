//! OAuth-backed credential provider.
//!
//! One provider per named service: builds the consent URL with a
//! one-shot state, exchanges the callback code for a token and keeps
//! the raw token response in a [`TokenStore`].

use async_trait::async_trait;
use http::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::flow::FlowStrategy;
use super::storage::{token_key, StoredToken, TokenStore};
use super::{AuthorizationCallback, CredentialProvider};
use crate::client::ApiResponse;
use crate::config::{ClientConfig, ServiceConfig};
use crate::errors::{AuthenticationError, SlackError, SlackResult};
use crate::transport::{append_query, FormRequest, HttpTransport};

/// Credential provider driving Slack's authorization-code flow
pub struct OAuthCredentialProvider {
    service: String,
    config: ServiceConfig,
    client_config: Arc<ClientConfig>,
    strategy: &'static dyn FlowStrategy,
    store: Arc<dyn TokenStore>,
    transport: Arc<dyn HttpTransport>,
    pending_states: Mutex<HashSet<String>>,
}

impl OAuthCredentialProvider {
    /// Create a provider for `service`; the flow follows the registration
    pub fn new(
        service: impl Into<String>,
        config: ServiceConfig,
        client_config: Arc<ClientConfig>,
        store: Arc<dyn TokenStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let strategy = config.flow_kind().strategy();
        Self {
            service: service.into(),
            config,
            client_config,
            strategy,
            store,
            transport,
            pending_states: Mutex::new(HashSet::new()),
        }
    }

    /// Service name
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The flow strategy in use
    pub fn strategy(&self) -> &'static dyn FlowStrategy {
        self.strategy
    }

    fn redirect_uri(&self) -> Option<&str> {
        self.config
            .redirect_uri
            .as_deref()
            .or(self.client_config.redirect_uri.as_deref())
    }

    fn new_state(&self) -> String {
        let state = format!("{}:{}", self.service, Uuid::new_v4().simple());
        self.pending_states.lock().insert(state.clone());
        state
    }

    fn consume_state(&self, state: Option<&str>) -> bool {
        match state {
            Some(state) => self.pending_states.lock().remove(state),
            None => false,
        }
    }

    async fn exchange_code(&self, code: &str) -> SlackResult<ApiResponse> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let url = self.client_config.build_url(self.strategy.token_endpoint());
        let mut request = FormRequest::post(url, headers)
            .field("client_id", self.config.client_id.clone())
            .field("client_secret", self.config.client_secret.expose_secret().clone())
            .field("code", code);
        if let Some(uri) = self.redirect_uri() {
            request = request.field("redirect_uri", uri);
        }

        let body = self
            .transport
            .send_form(request.with_timeout(self.client_config.timeout))
            .await?;

        ApiResponse::from_envelope(body)
    }

    async fn stored_response(&self) -> SlackResult<Option<Value>> {
        Ok(self
            .store
            .retrieve(&token_key(&self.service))
            .await?
            .map(|token| token.response().clone()))
    }
}

#[async_trait]
impl CredentialProvider for OAuthCredentialProvider {
    async fn access_token(&self) -> SlackResult<SecretString> {
        let response = self.stored_response().await?.ok_or_else(|| {
            SlackError::Authentication(AuthenticationError::NotAuthorized {
                service: self.service.clone(),
            })
        })?;

        self.strategy
            .extract_access_token(&response)
            .map(SecretString::new)
            .ok_or(SlackError::Authentication(
                AuthenticationError::MissingAccessToken {
                    path: self.strategy.token_path(),
                },
            ))
    }

    fn authorization_url(&self) -> SlackResult<String> {
        let mut params: Vec<(&str, String)> = vec![("client_id", self.config.client_id.clone())];
        params.extend(self.strategy.scope_params(&self.config));
        if let Some(uri) = self.redirect_uri() {
            params.push(("redirect_uri", uri.to_string()));
        }
        params.push(("state", self.new_state()));

        let base = self
            .client_config
            .build_oauth_url(self.strategy.authorize_path());
        Ok(append_query(&base, &params))
    }

    #[instrument(skip(self, callback), fields(service = %self.service))]
    async fn handle_authorization_callback(
        &self,
        callback: &AuthorizationCallback,
    ) -> SlackResult<bool> {
        if let Some(error) = &callback.error {
            info!(error = %error, "Authorization denied");
            return Ok(false);
        }

        let Some(code) = callback.code.as_deref() else {
            debug!("Callback without code");
            return Ok(false);
        };

        if !self.consume_state(callback.state.as_deref()) {
            warn!("Callback state does not match a pending authorization");
            return Ok(false);
        }

        let response = match self.exchange_code(code).await {
            Ok(response) => response,
            Err(SlackError::Api { code, .. }) => {
                warn!(code = %code, "Token exchange rejected");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let body = response.into_body();
        if self.strategy.extract_access_token(&body).is_none() {
            warn!(path = self.strategy.token_path(), "Token response carries no access token");
            return Ok(false);
        }

        self.store
            .store(&token_key(&self.service), StoredToken::new(body))
            .await?;
        info!("Service authorized");
        Ok(true)
    }

    async fn reset(&self) -> SlackResult<()> {
        self.store.delete(&token_key(&self.service)).await?;
        self.pending_states.lock().clear();
        Ok(())
    }

    async fn has_access(&self) -> bool {
        match self.stored_response().await {
            Ok(Some(response)) => self.strategy.extract_access_token(&response).is_some(),
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Token store lookup failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for OAuthCredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentialProvider")
            .field("service", &self.service)
            .field("flow", &self.strategy.kind())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
