//! Transient-failure classification and the submission retry wrapper.
//!
//! Only the generation call is wrapped; upload and status polling are not
//! retried. The wrapper inspects result kinds — no error is ever used as
//! control flow for an expected retry.

use super::{ExtractionService, GenerateOutcome, MediaRef};
use crate::error::{JobError, JobResult};
use std::time::Duration;

/// Backoff never grows past this, whatever the attempt count.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Retry policy for the generation call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Base backoff delay; doubles after each further transient failure
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

/// Whether a failure message indicates overload or unavailability.
///
/// Used by clients that cannot classify by status code alone.
pub fn is_overload_message(message: &str) -> bool {
    let m = message.to_ascii_lowercase();
    m.contains("overloaded") || m.contains("unavailable")
}

/// Whether a per-job error is worth retrying.
pub fn is_transient(error: &JobError) -> bool {
    matches!(error, JobError::Transient { .. })
}

/// Exponential backoff for a given retry index.
///
/// `base_delay * 2^retry_index`, capped at 60 seconds: with the default
/// 2-second base the waits are 2, 4, 8, ...
pub fn backoff_duration(retry_index: u32, base_delay: Duration) -> Duration {
    let millis = (base_delay.as_millis() as u64).saturating_mul(2u64.saturating_pow(retry_index));
    Duration::from_millis(millis).min(MAX_BACKOFF)
}

/// Submit one generation request, retrying transient failures.
///
/// Non-transient failures propagate immediately; exhausting the attempt
/// budget propagates the last transient error.
pub async fn submit_with_retry(
    service: &dyn ExtractionService,
    model: &str,
    prompt: &str,
    media: &MediaRef,
    policy: &RetryPolicy,
) -> JobResult<GenerateOutcome> {
    let mut retry_index = 0u32;
    loop {
        match service.generate(model, prompt, media).await {
            Ok(outcome) => return Ok(outcome),
            Err(error) if is_transient(&error) && retry_index + 1 < policy.max_attempts => {
                let delay = backoff_duration(retry_index, policy.base_delay);
                tracing::warn!(
                    "Transient failure on attempt {}/{}, retrying in {:?}: {error}",
                    retry_index + 1,
                    policy.max_attempts,
                    delay
                );
                tokio::time::sleep(delay).await;
                retry_index += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
