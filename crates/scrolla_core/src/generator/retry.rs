//! Retry policy for external generator calls.

use super::traits::GenerateError;
use log::warn;
use std::thread;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

/// Fixed-backoff retry applied to timeouts only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Runs `call` until it succeeds, fails with a non-timeout error, or
    /// attempts run out. `call` receives the 1-based attempt number.
    pub fn run<T>(
        &self,
        operation: &str,
        mut call: impl FnMut(u32) -> Result<T, GenerateError>,
    ) -> Result<T, GenerateError> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call(attempt) {
                // Why: a refused or malformed reply repeats on the next call;
                // only a model that ran out of time can succeed on retry.
                Err(err) if err.is_transient() => {
                    warn!(
                        "event=generator_retry module=generator operation={} attempt={} max_attempts={} error={}",
                        operation, attempt, max_attempts, err
                    );
                    if attempt >= max_attempts {
                        return Err(GenerateError::Timeout {
                            attempts: max_attempts,
                        });
                    }
                    thread::sleep(self.backoff);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
