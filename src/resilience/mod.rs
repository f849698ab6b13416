//! Resilience patterns for the Slack client.
//!
//! Slack signals throttling with the `ratelimited` code; the client
//! answers with a fixed cooldown and an identical re-issue.

pub mod cooldown;

pub use cooldown::{with_rate_limit_retry, RateLimitRetryConfig};
