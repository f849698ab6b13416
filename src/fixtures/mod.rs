//! Test fixtures for Slack API responses.
//!
//! Provides realistic envelopes for unit tests.

use serde_json::{json, Value};

/// A channel object as returned by `conversations.list`
pub fn channel(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "is_channel": true,
        "is_private": false,
        "is_archived": false,
        "created": 1_600_000_000,
        "topic": {
            "value": format!("{} topic", name),
            "creator": "U1234567890",
            "last_set": 1_600_000_000
        },
        "num_members": 3
    })
}

/// One `conversations.list` page
pub fn conversations_page(channels: Vec<Value>, next_cursor: &str) -> Value {
    json!({
        "ok": true,
        "channels": channels,
        "response_metadata": {
            "next_cursor": next_cursor
        }
    })
}

/// A message object as returned by `conversations.history`
pub fn message(ts: &str, user: &str, text: &str) -> Value {
    json!({
        "type": "message",
        "user": user,
        "text": text,
        "ts": ts
    })
}

/// One `conversations.history` page
pub fn history_page(messages: Vec<Value>, next_cursor: Option<&str>) -> Value {
    let mut page = json!({
        "ok": true,
        "messages": messages,
        "has_more": next_cursor.is_some(),
        "pin_count": 0
    });
    if let Some(cursor) = next_cursor {
        page["response_metadata"] = json!({ "next_cursor": cursor });
    }
    page
}

/// `auth.test` success
pub fn auth_test() -> Value {
    json!({
        "ok": true,
        "url": "https://ipdx.slack.com/",
        "team": "IPDX",
        "user": "tester",
        "team_id": "T1234567890",
        "user_id": "U1234567890"
    })
}

/// `ok:false` envelope with the given code
pub fn error(code: &str) -> Value {
    json!({
        "ok": false,
        "error": code
    })
}

/// The rate limit envelope
pub fn ratelimited() -> Value {
    error(crate::errors::RATE_LIMITED_CODE)
}

/// `oauth.access` response of a classic app
pub fn classic_token_response(token: &str) -> Value {
    json!({
        "ok": true,
        "access_token": token,
        "scope": "identify,channels:history,channels:read",
        "user_id": "U1234567890",
        "team_id": "T1234567890"
    })
}

/// `oauth.v2.access` response carrying a user token
pub fn v2_token_response(user_token: &str) -> Value {
    json!({
        "ok": true,
        "app_id": "A0KRD7HC3",
        "authed_user": {
            "id": "U1234567890",
            "scope": "channels:history,channels:read",
            "access_token": user_token,
            "token_type": "user"
        },
        "team": {
            "id": "T1234567890",
            "name": "IPDX"
        },
        "enterprise": null,
        "is_enterprise_install": false
    })
}
