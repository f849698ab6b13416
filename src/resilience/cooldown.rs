//! Fixed-interval retry for rate-limited calls.

use crate::config::ClientConfig;
use crate::errors::{SlackError, SlackResult, RATE_LIMITED_CODE};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for the rate limit cooldown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRetryConfig {
    /// Wait between a rejection and the re-issue
    pub cooldown: Duration,
    /// Cap on re-issues; `None` keeps retrying until a different outcome
    pub max_retries: Option<u32>,
}

impl Default for RateLimitRetryConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(crate::DEFAULT_RATE_LIMIT_COOLDOWN_SECS),
            max_retries: None,
        }
    }
}

impl RateLimitRetryConfig {
    /// Create a new retry configuration
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            max_retries: None,
        }
    }

    /// Set maximum retries
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n);
        self
    }

    fn exhausted(&self, retries: u32) -> bool {
        self.max_retries.map(|max| retries >= max).unwrap_or(false)
    }
}

impl From<&ClientConfig> for RateLimitRetryConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            cooldown: config.rate_limit_cooldown,
            max_retries: config.max_rate_limit_retries,
        }
    }
}

/// Run `operation`, sleeping `cooldown` and re-running it after every
/// rate limit rejection. Any other error is returned immediately.
pub async fn with_rate_limit_retry<F, Fut, T>(
    config: &RateLimitRetryConfig,
    cancel: &CancellationToken,
    mut operation: F,
) -> SlackResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SlackResult<T>>,
{
    let mut retries = 0u32;

    loop {
        match operation().await {
            Ok(result) => {
                if retries > 0 {
                    debug!(retries, "Operation succeeded after cooldown");
                }
                return Ok(result);
            }
            Err(error) if error.is_rate_limited() => {
                if config.exhausted(retries) {
                    warn!(retries, "Rate limit retries exhausted");
                    return Err(SlackError::Api {
                        code: RATE_LIMITED_CODE.to_string(),
                        message: format!("still rate limited after {} retries", retries),
                    });
                }

                warn!(
                    retries,
                    cooldown_secs = config.cooldown.as_secs(),
                    "Rate limited, cooling down"
                );

                tokio::select! {
                    _ = cancel.cancelled() => return Err(SlackError::Cancelled),
                    _ = tokio::time::sleep(config.cooldown) => {}
                }
                retries += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{NetworkError, RateLimitError};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn rate_limited() -> SlackError {
        SlackError::RateLimit(RateLimitError::RateLimited { retry_after: None })
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_after_cooldown() {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let config = RateLimitRetryConfig::new(Duration::from_secs(60));
        let start = Instant::now();

        let result = with_rate_limit_retry(&config, &CancellationToken::new(), || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(rate_limited())
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_are_not_retried() {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let config = RateLimitRetryConfig::default();

        let result: SlackResult<()> =
            with_rate_limit_retry(&config, &CancellationToken::new(), || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(SlackError::Network(NetworkError::Timeout))
            })
            .await;

        assert!(matches!(result, Err(SlackError::Network(NetworkError::Timeout))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_retries_surface_ratelimited_code() {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let config = RateLimitRetryConfig::new(Duration::from_secs(1)).max_retries(2);

        let result: SlackResult<()> =
            with_rate_limit_retry(&config, &CancellationToken::new(), || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(rate_limited())
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.api_code(), Some("ratelimited"));
        assert!(!err.is_rate_limited());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_cooldown() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let config = RateLimitRetryConfig::default();

        let result: SlackResult<()> =
            with_rate_limit_retry(&config, &cancel, || async { Err(rate_limited()) }).await;

        assert!(matches!(result, Err(SlackError::Cancelled)));
    }
}
