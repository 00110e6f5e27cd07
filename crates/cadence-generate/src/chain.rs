// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The retrying backend chain.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use cadence_config::model::GenerationConfig;
use cadence_core::error::CadenceError;
use cadence_core::traits::backend::{BackendFailure, GenerationBackend};
use cadence_core::types::GenerationOutput;

/// Consecutive rate-limit retries allowed on one non-primary backend before
/// falling through to the next.
const MAX_RATE_LIMIT_RETRIES: u32 = 2;

/// Produces reply text from a ranked list of generation back-ends with
/// resilience to rate limiting and transient failure.
///
/// The generator has no side effects beyond the backend calls themselves;
/// callers that need cancellation race [`generate`](Self::generate) against
/// their own cancellation signal.
pub struct RetryingGenerator {
    backends: Vec<Arc<dyn GenerationBackend>>,
    max_attempts: u32,
    backoff_step: Duration,
}

impl RetryingGenerator {
    /// Creates a generator over `backends` in priority order (index 0 is the
    /// primary).
    pub fn new(config: &GenerationConfig, backends: Vec<Arc<dyn GenerationBackend>>) -> Self {
        Self {
            backends,
            max_attempts: config.max_attempts,
            backoff_step: Duration::from_secs(config.backoff_step_secs),
        }
    }

    /// Number of configured back-ends.
    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    /// Runs the chain until one backend produces text, the attempt ceiling is
    /// hit, or every backend has been exhausted.
    pub async fn generate(&self, prompt: &str) -> Result<GenerationOutput, CadenceError> {
        let mut attempts: u32 = 0;
        let mut last_error = String::from("no generation backends configured");

        'chain: for (index, backend) in self.backends.iter().enumerate() {
            let mut rate_limit_retries: u32 = 0;

            loop {
                if attempts >= self.max_attempts {
                    break 'chain;
                }
                attempts += 1;

                match backend.generate(prompt).await {
                    Ok(text) => {
                        info!(
                            backend = backend.name(),
                            attempts, "generation succeeded"
                        );
                        return Ok(GenerationOutput {
                            text,
                            backend: backend.name().to_string(),
                            attempts,
                        });
                    }
                    Err(BackendFailure::RateLimited) => {
                        last_error = format!("{} rate limited", backend.name());

                        if index == 0 {
                            // Primary exhaustion persists for the retry
                            // horizon; don't burn attempts re-asking it.
                            warn!(
                                backend = backend.name(),
                                "primary backend rate limited, falling through"
                            );
                            continue 'chain;
                        }

                        if rate_limit_retries >= MAX_RATE_LIMIT_RETRIES
                            || attempts >= self.max_attempts
                        {
                            warn!(
                                backend = backend.name(),
                                "rate limit persists, falling through"
                            );
                            continue 'chain;
                        }

                        rate_limit_retries += 1;
                        let backoff = self.backoff_step * rate_limit_retries;
                        debug!(
                            backend = backend.name(),
                            backoff_secs = backoff.as_secs(),
                            "rate limited, backing off before retry"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                    Err(BackendFailure::Unavailable(msg)) => {
                        last_error = format!("{}: {msg}", backend.name());
                        warn!(
                            backend = backend.name(),
                            error = %msg,
                            "backend failed, escalating to next"
                        );
                        continue 'chain;
                    }
                }
            }
        }

        Err(CadenceError::Generation {
            message: last_error,
            attempts,
        })
    }
}
