//! The two Slack OAuth variants.
//!
//! Classic apps authorize at `/oauth/authorize`, exchange at
//! `oauth.access` and get the token at the top level of the response.
//! Standard (v2) apps authorize at `/oauth/v2/authorize`, exchange at
//! `oauth.v2.access` and get the user token under `authed_user`.

use crate::config::{FlowKind, ServiceConfig};
use serde::Deserialize;
use serde_json::Value;

/// Request building and token extraction for one OAuth variant
pub trait FlowStrategy: Send + Sync + std::fmt::Debug {
    /// Which variant this is
    fn kind(&self) -> FlowKind;

    /// Consent page path, relative to the OAuth base URL
    fn authorize_path(&self) -> &'static str;

    /// Code exchange method, relative to the Web API base URL
    fn token_endpoint(&self) -> &'static str;

    /// Scope parameters for the consent URL
    fn scope_params(&self, config: &ServiceConfig) -> Vec<(&'static str, String)>;

    /// Where the token lives in the exchange response, for diagnostics
    fn token_path(&self) -> &'static str;

    /// Pull the access token out of an exchange response
    fn extract_access_token(&self, response: &Value) -> Option<String>;
}

/// Response from oauth.access
#[derive(Debug, Deserialize)]
struct ClassicAccessResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Response from oauth.v2.access
#[derive(Debug, Deserialize)]
struct V2AccessResponse {
    #[serde(default)]
    authed_user: Option<AuthedUser>,
}

#[derive(Debug, Deserialize)]
struct AuthedUser {
    #[serde(default)]
    access_token: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Legacy workspace-app flow
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicFlow;

impl FlowStrategy for ClassicFlow {
    fn kind(&self) -> FlowKind {
        FlowKind::Classic
    }

    fn authorize_path(&self) -> &'static str {
        "authorize"
    }

    fn token_endpoint(&self) -> &'static str {
        "oauth.access"
    }

    fn scope_params(&self, config: &ServiceConfig) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !config.scope.is_empty() {
            params.push(("scope", config.scope.clone()));
        }
        params
    }

    fn token_path(&self) -> &'static str {
        "access_token"
    }

    fn extract_access_token(&self, response: &Value) -> Option<String> {
        let parsed: ClassicAccessResponse = serde_json::from_value(response.clone()).ok()?;
        non_empty(parsed.access_token)
    }
}

/// OAuth v2 flow with user scopes
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFlow;

impl FlowStrategy for StandardFlow {
    fn kind(&self) -> FlowKind {
        FlowKind::Standard
    }

    fn authorize_path(&self) -> &'static str {
        "v2/authorize"
    }

    fn token_endpoint(&self) -> &'static str {
        "oauth.v2.access"
    }

    fn scope_params(&self, config: &ServiceConfig) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !config.scope.is_empty() {
            params.push(("scope", config.scope.clone()));
        }
        if let Some(user_scope) = config.user_scope.as_ref().filter(|s| !s.is_empty()) {
            params.push(("user_scope", user_scope.clone()));
        }
        params
    }

    fn token_path(&self) -> &'static str {
        "authed_user.access_token"
    }

    fn extract_access_token(&self, response: &Value) -> Option<String> {
        let parsed: V2AccessResponse = serde_json::from_value(response.clone()).ok()?;
        non_empty(parsed.authed_user.and_then(|user| user.access_token))
    }
}

impl FlowKind {
    /// The strategy implementing this flow kind
    pub fn strategy(self) -> &'static dyn FlowStrategy {
        match self {
            FlowKind::Classic => &ClassicFlow,
            FlowKind::Standard => &StandardFlow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strategy_selection() {
        assert_eq!(FlowKind::Classic.strategy().kind(), FlowKind::Classic);
        assert_eq!(FlowKind::Standard.strategy().kind(), FlowKind::Standard);
        assert_eq!(FlowKind::Classic.strategy().token_endpoint(), "oauth.access");
        assert_eq!(FlowKind::Standard.strategy().token_endpoint(), "oauth.v2.access");
    }

    #[test]
    fn test_classic_reads_top_level_token() {
        let response = json!({
            "ok": true,
            "access_token": "xoxp-classic",
            "scope": "channels:read",
            "authed_user": { "access_token": "xoxp-ignored" }
        });

        assert_eq!(
            ClassicFlow.extract_access_token(&response).as_deref(),
            Some("xoxp-classic")
        );
    }

    #[test]
    fn test_standard_reads_authed_user_token() {
        let response = json!({
            "ok": true,
            "access_token": "xoxb-bot",
            "authed_user": { "id": "U1", "access_token": "xoxp-user" }
        });

        assert_eq!(
            StandardFlow.extract_access_token(&response).as_deref(),
            Some("xoxp-user")
        );
        assert_eq!(StandardFlow.extract_access_token(&json!({"ok": true})), None);
    }

    #[test]
    fn test_scope_params() {
        let config = ServiceConfig::new("id", "secret")
            .with_scope("channels:read")
            .with_user_scope("search:read");

        assert_eq!(
            StandardFlow.scope_params(&config),
            vec![
                ("scope", "channels:read".to_string()),
                ("user_scope", "search:read".to_string())
            ]
        );
        assert_eq!(
            ClassicFlow.scope_params(&config),
            vec![("scope", "channels:read".to_string())]
        );
    }
}
