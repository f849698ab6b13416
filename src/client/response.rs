//! Decoding of Slack's `{ok, error, ...}` envelope.

use crate::errors::{ResponseError, SlackError, SlackResult};
use serde_json::Value;

/// JSON pointer to the pagination cursor
const NEXT_CURSOR_POINTER: &str = "/response_metadata/next_cursor";

/// One decoded Web API response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// Envelope success flag
    pub ok: bool,
    /// Envelope error code when `ok` is false
    pub error_code: Option<String>,
    /// The whole decoded body
    pub body: Value,
    /// Non-empty `response_metadata.next_cursor`
    pub cursor: Option<String>,
}

impl ApiResponse {
    /// Read the envelope fields without judging them
    pub fn decode(body: Value) -> SlackResult<Self> {
        if !body.is_object() {
            return Err(SlackError::Response(ResponseError::UnexpectedResponse {
                message: "response body is not a JSON object".to_string(),
            }));
        }

        let ok = body
            .get("ok")
            .and_then(Value::as_bool)
            .ok_or(SlackError::Response(ResponseError::MissingOkField))?;

        let error_code = body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string);

        let cursor = body
            .pointer(NEXT_CURSOR_POINTER)
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(Self {
            ok,
            error_code,
            body,
            cursor,
        })
    }

    /// Turn an `ok:false` envelope into its error
    pub fn into_result(self) -> SlackResult<Self> {
        if self.ok {
            return Ok(self);
        }

        let code = self.error_code.as_deref().unwrap_or("unknown_error");
        let message = self.body.get("detail").and_then(Value::as_str);
        Err(SlackError::from_slack_error(code, message))
    }

    /// Decode and reject failures in one step
    pub fn from_envelope(body: Value) -> SlackResult<Self> {
        Self::decode(body)?.into_result()
    }

    /// Cursor for the next page, if any
    pub fn next_cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// The decoded body
    pub fn into_body(self) -> Value {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_cursor() {
        let response = ApiResponse::from_envelope(json!({
            "ok": true,
            "channels": [],
            "response_metadata": { "next_cursor": "dGVhbTpDMDYx" }
        }))
        .unwrap();
        assert_eq!(response.next_cursor(), Some("dGVhbTpDMDYx"));

        let last = ApiResponse::from_envelope(json!({
            "ok": true,
            "response_metadata": { "next_cursor": "" }
        }))
        .unwrap();
        assert_eq!(last.next_cursor(), None);

        let bare = ApiResponse::from_envelope(json!({"ok": true})).unwrap();
        assert_eq!(bare.next_cursor(), None);
    }

    #[test]
    fn test_error_envelope() {
        let err = ApiResponse::from_envelope(json!({"ok": false, "error": "channel_not_found"}))
            .unwrap_err();
        assert_eq!(err.api_code(), Some("channel_not_found"));

        let err = ApiResponse::from_envelope(json!({"ok": false, "error": "ratelimited"}))
            .unwrap_err();
        assert!(err.is_rate_limited());

        let decoded = ApiResponse::decode(json!({"ok": false, "error": "not_authed"})).unwrap();
        assert!(!decoded.ok);
        assert_eq!(decoded.error_code.as_deref(), Some("not_authed"));
    }

    #[test]
    fn test_missing_ok_field() {
        let err = ApiResponse::from_envelope(json!({"channels": []})).unwrap_err();
        assert!(matches!(err, SlackError::Response(ResponseError::MissingOkField)));

        let err = ApiResponse::from_envelope(json!([1, 2])).unwrap_err();
        assert!(matches!(err, SlackError::Response(ResponseError::UnexpectedResponse { .. })));
    }
}
