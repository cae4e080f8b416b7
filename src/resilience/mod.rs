use crate::core::config::Config;
use crate::core::constants::*;
use crate::core::types::ProviderError;
use log::{debug, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Timeout and retry budget for one provider call.
#[derive(Debug, Clone)]
pub struct CallPolicy {
    /// Per-attempt timeout (milliseconds)
    pub timeout_ms: u64,
    /// Maximum number of attempts, first call included
    pub max_attempts: u32,
    /// Base delay between retries (milliseconds)
    pub base_delay_ms: u64,
    /// Maximum delay between retries (milliseconds)
    pub max_delay_ms: u64,
    /// Exponential backoff multiplier
    pub backoff_multiplier: f64,
}

impl CallPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout_ms: config.call_timeout_ms,
            max_attempts: config.max_call_attempts,
            ..Self::default()
        }
    }

    fn retry_delay(&self, attempt: u32) -> u64 {
        let delay =
            self.base_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32 - 1);
        (delay as u64).min(self.max_delay_ms)
    }
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            max_attempts: MAX_CALL_ATTEMPTS,
            base_delay_ms: BASE_RETRY_DELAY_MS,
            max_delay_ms: MAX_RETRY_DELAY_MS,
            backoff_multiplier: RETRY_BACKOFF_MULTIPLIER,
        }
    }
}

/// Run one provider call under the policy.
///
/// Every failure comes back as a `ProviderError` value: an attempt that
/// outlives the per-call timeout is abandoned and reported as `Timeout`,
/// and only transient kinds are retried. Nothing escapes this boundary,
/// so one provider cannot take down an aggregation round.
pub async fn execute<T, F, Fut>(
    policy: &CallPolicy,
    provider: &str,
    mut call: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let per_attempt = Duration::from_millis(policy.timeout_ms);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let outcome = match timeout(per_attempt, call()).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::timeout(
                provider,
                format!("no response within {}ms", policy.timeout_ms),
            )),
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.retry_delay(attempt);
                debug!(
                    "Retrying {} in {}ms (attempt {}/{}): {}",
                    provider, delay, attempt, policy.max_attempts, err
                );
                sleep(Duration::from_millis(delay)).await;
            }
            Err(err) => {
                warn!("Provider {} failed after {} attempt(s): {}", provider, attempt, err);
                return Err(err);
            }
        }
    }
}
