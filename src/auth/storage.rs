//! Token Storage
//!
//! Keeps the raw token response of each authorized service, keyed by
//! `oauth2.{service}`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

use crate::errors::SlackResult;
use crate::observability::Redacted;

/// Storage key for a service's token
pub fn token_key(service: &str) -> String {
    format!("oauth2.{}", service)
}

/// A token response as received from the exchange
#[derive(Debug, Clone)]
pub struct StoredToken {
    response: Redacted<Value>,
    /// When the exchange completed
    pub stored_at: DateTime<Utc>,
}

impl StoredToken {
    /// Wrap a token response received now
    pub fn new(response: Value) -> Self {
        Self {
            response: Redacted::new(response),
            stored_at: Utc::now(),
        }
    }

    /// The raw token response
    pub fn response(&self) -> &Value {
        self.response.expose()
    }
}

/// Token storage interface.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store a token under a key, replacing any previous one.
    async fn store(&self, key: &str, token: StoredToken) -> SlackResult<()>;

    /// Retrieve the token for a key.
    async fn retrieve(&self, key: &str) -> SlackResult<Option<StoredToken>>;

    /// Delete the token for a key; `true` if one existed.
    async fn delete(&self, key: &str) -> SlackResult<bool>;
}

/// In-memory token storage implementation.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: Mutex<HashMap<String, StoredToken>>,
}

impl InMemoryTokenStore {
    /// Create new in-memory token storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tokens.
    pub fn len(&self) -> usize {
        self.tokens.lock().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.tokens.lock().is_empty()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn store(&self, key: &str, token: StoredToken) -> SlackResult<()> {
        self.tokens.lock().insert(key.to_string(), token);
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> SlackResult<Option<StoredToken>> {
        Ok(self.tokens.lock().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> SlackResult<bool> {
        Ok(self.tokens.lock().remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_store_retrieve_delete() {
        let store = InMemoryTokenStore::new();
        let key = token_key("ipdx");
        assert_eq!(key, "oauth2.ipdx");

        store
            .store(&key, StoredToken::new(json!({"access_token": "xoxp-1"})))
            .await
            .unwrap();
        assert_eq!(store.len(), 1);

        let token = store.retrieve(&key).await.unwrap().unwrap();
        assert_eq!(token.response()["access_token"], "xoxp-1");
        assert!(store.retrieve("oauth2.other").await.unwrap().is_none());

        assert!(store.delete(&key).await.unwrap());
        assert!(!store.delete(&key).await.unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_stored_token_debug_hides_response() {
        let token = StoredToken::new(json!({"access_token": "xoxp-secret"}));
        assert!(!format!("{:?}", token).contains("xoxp-secret"));
    }
}
