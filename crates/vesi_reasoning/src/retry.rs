//! Backoff for the initial request to the model server.
//!
//! Only the request itself is retried (429, 5xx, connect errors). Once a
//! response body starts streaming, failures are final for the turn.

use anyhow::Result;
use reqwest::{Response, StatusCode};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts including the first.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::REQUEST_TIMEOUT
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Run `operation` until it yields a 2xx response, a non-retryable status,
/// or the policy is exhausted.
pub async fn send_with_retry<F, Fut>(
    policy: &RetryPolicy,
    target: &str,
    operation: F,
) -> Result<Response>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = reqwest::Result<Response>>,
{
    let mut delay = policy.initial_delay;
    let mut last_error = String::from("no attempt made");

    for attempt in 1..=policy.max_attempts {
        match operation().await {
            Ok(response) if response.status().is_success() => {
                if attempt > 1 {
                    tracing::info!("{} succeeded on attempt {}", target, attempt);
                }
                return Ok(response);
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                if !is_retryable_status(status) {
                    anyhow::bail!("{} error {}: {}", target, status, body);
                }
                tracing::warn!(
                    "{} returned {} on attempt {}/{}",
                    target,
                    status,
                    attempt,
                    policy.max_attempts
                );
                last_error = format!("{} ({}): {}", target, status, body);
            }
            Err(e) => {
                tracing::warn!(
                    "{} request failed on attempt {}/{}: {}",
                    target,
                    attempt,
                    policy.max_attempts,
                    e
                );
                last_error = format!("{}: {}", target, e);
            }
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(policy.max_delay);
        }
    }

    anyhow::bail!(
        "{} attempt(s) exhausted. Last error: {}",
        policy.max_attempts,
        last_error
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_attempts_never_zero() {
        assert_eq!(RetryPolicy::attempts(0).max_attempts, 1);
        assert_eq!(RetryPolicy::attempts(3).max_attempts, 3);
    }
}
