// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation backend trait for reply-text producers.

use async_trait::async_trait;
use thiserror::Error;

/// Failure modes a generation backend reports to the retry chain.
///
/// The distinction matters for chain behavior: rate-limiting on the primary
/// backend causes an immediate fall-through, rate-limiting elsewhere is
/// retried with backoff, and anything else escalates to the next backend.
#[derive(Debug, Error)]
pub enum BackendFailure {
    /// The backend refused the request due to rate limiting or quota exhaustion.
    #[error("rate limited")]
    RateLimited,

    /// Any other failure (network error, malformed response, model error).
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// One reply-text producer in the ranked generation chain.
///
/// Implementations are supplied by the embedding application; the
/// orchestrator treats prompt content and generated text as opaque strings.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Human-readable backend name, used in logs and [`GenerationOutput`].
    ///
    /// [`GenerationOutput`]: crate::types::GenerationOutput
    fn name(&self) -> &str;

    /// Produces reply text for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String, BackendFailure>;
}
