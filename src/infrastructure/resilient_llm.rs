//! Retrying wrapper around any `LlmPort`
//!
//! Transient failures are retried with exponential backoff and jitter.
//! Client errors (bad request, auth) fail immediately.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::{error, info, warn};

use crate::application::ports::outbound::{LlmError, LlmPort, LlmRequest, LlmResponse};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt; 0 disables retrying
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Fraction of the delay applied as random jitter, in `[0, 1]`
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 5_000,
            jitter_factor: 0.2,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

pub struct ResilientLlmClient {
    inner: Arc<dyn LlmPort>,
    config: RetryConfig,
}

impl ResilientLlmClient {
    pub fn new(inner: Arc<dyn LlmPort>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// Backoff before retry number `attempt` (1-based)
    fn calculate_delay(&self, attempt: u32) -> u64 {
        let exponential = self
            .config
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = exponential.min(self.config.max_delay_ms);

        let jitter_range = (capped as f64 * self.config.jitter_factor) as i64;
        if jitter_range <= 0 {
            return capped;
        }
        let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
        (capped as i64 + jitter).max(0) as u64
    }

    fn is_retryable(error: &LlmError) -> bool {
        match error {
            LlmError::RequestFailed(message) => !["400", "401", "403", "404"]
                .iter()
                .any(|code| message.contains(code)),
            LlmError::InvalidResponse(_) => true,
        }
    }
}

#[async_trait]
impl LlmPort for ResilientLlmClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let mut attempt = 0;
        loop {
            let error = match self.inner.generate(request.clone()).await {
                Ok(response) => {
                    if attempt > 0 {
                        info!(attempt = attempt + 1, "LLM request succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(e) => e,
            };

            if !Self::is_retryable(&error) {
                error!(error = %error, "LLM request failed with non-retryable error");
                return Err(error);
            }
            if attempt >= self.config.max_retries {
                error!(attempts = attempt + 1, error = %error, "LLM request failed after all retries");
                return Err(error);
            }

            attempt += 1;
            let delay = self.calculate_delay(attempt);
            warn!(
                attempt,
                max_retries = self.config.max_retries,
                delay_ms = delay,
                error = %error,
                "LLM request failed, retrying"
            );
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// Fails a fixed number of times, then answers
    struct FlakyLlm {
        failures_left: AtomicU32,
        calls: AtomicU32,
        error: LlmError,
    }

    impl FlakyLlm {
        fn new(failures: u32, error: LlmError) -> Self {
            Self {
                failures_left: AtomicU32::new(failures),
                calls: AtomicU32::new(0),
                error,
            }
        }
    }

    #[async_trait]
    impl LlmPort for FlakyLlm {
        async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(self.error.clone());
            }
            Ok(LlmResponse {
                content: "The road winds on.".to_string(),
                model: "test".to_string(),
                tokens_used: 4,
            })
        }
    }

    fn fast(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay_ms: 1,
            max_delay_ms: 5,
            jitter_factor: 0.0,
        }
    }

    #[tokio::test]
    async fn test_recovers_from_transient_failures() {
        let inner = Arc::new(FlakyLlm::new(2, LlmError::RequestFailed("connection reset".into())));
        let client = ResilientLlmClient::new(inner.clone(), fast(2));

        let response = client.generate(LlmRequest::new(vec![])).await.unwrap();

        assert_eq!(response.content, "The road winds on.");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let inner = Arc::new(FlakyLlm::new(10, LlmError::InvalidResponse("garbled".into())));
        let client = ResilientLlmClient::new(inner.clone(), fast(2));

        assert!(client.generate(LlmRequest::new(vec![])).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let inner = Arc::new(FlakyLlm::new(10, LlmError::RequestFailed("401 Unauthorized".into())));
        let client = ResilientLlmClient::new(inner.clone(), fast(3));

        assert!(client.generate(LlmRequest::new(vec![])).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = RetryConfig {
            max_retries: 5,
            base_delay_ms: 500,
            max_delay_ms: 3_000,
            jitter_factor: 0.0,
        };
        let client = ResilientLlmClient::new(
            Arc::new(FlakyLlm::new(0, LlmError::RequestFailed(String::new()))),
            config,
        );

        assert_eq!(client.calculate_delay(1), 500);
        assert_eq!(client.calculate_delay(2), 1_000);
        assert_eq!(client.calculate_delay(3), 2_000);
        assert_eq!(client.calculate_delay(4), 3_000);
    }

    #[test]
    fn test_jitter_stays_in_band() {
        let client = ResilientLlmClient::new(
            Arc::new(FlakyLlm::new(0, LlmError::RequestFailed(String::new()))),
            RetryConfig::default(),
        );
        for _ in 0..50 {
            let delay = client.calculate_delay(1);
            assert!((400..=600).contains(&delay), "{}", delay);
        }
    }
}
