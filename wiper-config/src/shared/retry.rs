use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Retry policy for re-submitting deletes that the store left unprocessed.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Re-submissions of a batch before its table fails with unprocessed deletes.
    pub max_attempts: u32,
    /// Wait before the first re-submission, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound for the wait between re-submissions, in milliseconds.
    pub max_delay_ms: u64,
    /// Growth of the wait after every re-submission.
    pub backoff_factor: f32,
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backoff_factor < 1.0 {
            return Err(ValidationError::InvalidRetry(
                "`backoff_factor` must be at least 1.0",
            ));
        }

        if self.initial_delay_ms > self.max_delay_ms {
            return Err(ValidationError::InvalidRetry(
                "`initial_delay_ms` cannot exceed `max_delay_ms`",
            ));
        }

        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_factor: 2.0,
        }
    }
}
