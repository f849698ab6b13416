//! Web API request description.

use crate::transport::append_query;

/// Query parameter carrying the pagination cursor
pub const CURSOR_PARAM: &str = "cursor";

/// Query parameter that pins a call to a single page
pub const LIMIT_PARAM: &str = "limit";

/// One GET against a Web API method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    endpoint: String,
    params: Vec<(String, String)>,
}

impl ApiRequest {
    /// Create a request for `endpoint` (e.g. `conversations.list`)
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: Vec::new(),
        }
    }

    /// Append a query parameter; order is kept on the wire
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Append several query parameters
    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Web API method name
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Query parameters in wire order
    pub fn query(&self) -> &[(String, String)] {
        &self.params
    }

    /// Whether a parameter with this key is present
    pub fn has_param(&self, key: &str) -> bool {
        self.params.iter().any(|(k, _)| k == key)
    }

    /// The follow-up request for `cursor`: the cursor goes first, then
    /// the caller's parameters
    pub fn with_cursor(&self, cursor: &str) -> Self {
        let mut params = Vec::with_capacity(self.params.len() + 1);
        params.push((CURSOR_PARAM.to_string(), cursor.to_string()));
        params.extend(
            self.params
                .iter()
                .filter(|(k, _)| k != CURSOR_PARAM)
                .cloned(),
        );

        Self {
            endpoint: self.endpoint.clone(),
            params,
        }
    }

    /// Full URL below `base_url`
    pub fn url(&self, base_url: &str) -> String {
        let base = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        );
        append_query(&base, &self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_keeps_parameter_order() {
        let request = ApiRequest::new("conversations.history")
            .param("channel", "C123")
            .param("oldest", "1600000000.000100");

        assert_eq!(
            request.url("https://slack.com/api/"),
            "https://slack.com/api/conversations.history?channel=C123&oldest=1600000000.000100"
        );
    }

    #[test]
    fn test_url_without_params() {
        assert_eq!(
            ApiRequest::new("auth.test").url("https://slack.com/api"),
            "https://slack.com/api/auth.test"
        );
    }

    #[test]
    fn test_with_cursor_goes_first() {
        let request = ApiRequest::new("conversations.list").param("types", "public_channel,private_channel");
        let next = request.with_cursor("dGVhbTpDMDYx");

        assert_eq!(
            next.query(),
            &[
                ("cursor".to_string(), "dGVhbTpDMDYx".to_string()),
                ("types".to_string(), "public_channel,private_channel".to_string()),
            ]
        );
        // receiver keeps no cursor
        assert!(!request.has_param(CURSOR_PARAM));

        let again = next.with_cursor("c2");
        assert_eq!(again.query().len(), 2);
        assert_eq!(again.query()[0].1, "c2");
    }

    #[test]
    fn test_has_param_matches_keys_only() {
        let request = ApiRequest::new("search.messages").param("query", "limit");
        assert!(!request.has_param(LIMIT_PARAM));
        assert!(request.clone().param("limit", "5").has_param(LIMIT_PARAM));
    }
}
