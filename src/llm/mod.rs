pub mod client;
pub mod json;

use async_trait::async_trait;
use thiserror::Error;

/// Failure modes of the raw prompt-in/text-out transport.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out after {0}s")]
    Timeout(u64),
}

/// The reasoning-service seam. Production uses the HTTP client in
/// [`client`]; tests inject scripted implementations.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError>;
}

/// Exponential backoff calculator for retries against the service.
pub struct ExponentialBackoff {
    initial_delay_ms: u64,
    max_delay_ms: u64,
    multiplier: f64,
}

impl ExponentialBackoff {
    pub fn new(initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        ExponentialBackoff {
            initial_delay_ms,
            max_delay_ms,
            multiplier: 2.0,
        }
    }

    /// Calculate delay for attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let delay = (self.initial_delay_ms as f64 * self.multiplier.powi(attempt as i32)) as u64;
        delay.min(self.max_delay_ms)
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(100, 5000) // 100ms initial, 5s max
    }
}

/// Call the service with bounded retries and backoff. Attempts are
/// `1 + retry_budget`; every transient failure is logged and counted.
pub async fn complete_with_retry(
    service: &dyn ReasoningService,
    prompt: &str,
    max_tokens: u32,
    retry_budget: u32,
    metrics: &crate::metrics::Metrics,
) -> Result<String, LlmError> {
    let backoff = ExponentialBackoff::default();
    let mut attempt = 0u32;
    loop {
        match service.complete(prompt, max_tokens).await {
            Ok(text) => {
                if attempt > 0 {
                    tracing::info!(attempt = attempt, "Reasoning call succeeded after retry");
                }
                return Ok(text);
            }
            Err(e) if attempt < retry_budget => {
                let delay_ms = backoff.delay_for_attempt(attempt);
                tracing::warn!(
                    error = %e,
                    attempt = attempt + 1,
                    max_attempts = retry_budget + 1,
                    delay_ms = delay_ms,
                    "Reasoning call failed, retrying with backoff"
                );
                metrics.record_llm_retry();
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    attempts = attempt + 1,
                    "Reasoning call failed after all retries"
                );
                return Err(e);
            }
        }
    }
}
