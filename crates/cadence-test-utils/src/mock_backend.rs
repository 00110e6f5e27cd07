// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock generation backend for deterministic testing.
//!
//! `MockBackend` implements `GenerationBackend` with pre-scripted outcomes,
//! popped FIFO. When the script runs out it returns a default reply, so
//! tests that only care about the pipeline shape need no setup.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use cadence_core::traits::backend::{BackendFailure, GenerationBackend};

/// One scripted backend outcome.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    Reply(String),
    RateLimited,
    Unavailable(String),
}

/// A mock generation backend with a FIFO outcome script.
pub struct MockBackend {
    name: String,
    outcomes: Mutex<VecDeque<ScriptedOutcome>>,
    /// Every prompt this backend was asked to generate for.
    prompts: Mutex<Vec<String>>,
    calls: AtomicU32,
}

impl MockBackend {
    /// Creates a backend with an empty script (always returns the default
    /// reply).
    pub fn new(name: &str) -> Arc<Self> {
        Self::with_script(name, Vec::new())
    }

    /// Creates a backend pre-loaded with the given outcomes.
    pub fn with_script(name: &str, outcomes: Vec<ScriptedOutcome>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            outcomes: Mutex::new(VecDeque::from(outcomes)),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        })
    }

    /// Appends an outcome to the end of the script.
    pub async fn push_outcome(&self, outcome: ScriptedOutcome) {
        self.outcomes.lock().await.push_back(outcome);
    }

    /// Prompts received so far, in order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    /// Total number of generate calls.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(prompt.to_string());

        match self.outcomes.lock().await.pop_front() {
            Some(ScriptedOutcome::Reply(text)) => Ok(text),
            Some(ScriptedOutcome::RateLimited) => Err(BackendFailure::RateLimited),
            Some(ScriptedOutcome::Unavailable(msg)) => Err(BackendFailure::Unavailable(msg)),
            None => Ok("mock reply".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_reply_when_script_empty() {
        let backend = MockBackend::new("mock");
        let text = backend.generate("prompt").await.unwrap();
        assert_eq!(text, "mock reply");
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn scripted_outcomes_pop_in_order() {
        let backend = MockBackend::with_script(
            "mock",
            vec![
                ScriptedOutcome::RateLimited,
                ScriptedOutcome::Reply("second".into()),
            ],
        );

        assert!(matches!(
            backend.generate("p1").await,
            Err(BackendFailure::RateLimited)
        ));
        assert_eq!(backend.generate("p2").await.unwrap(), "second");
        assert_eq!(backend.prompts().await, vec!["p1", "p2"]);
    }
}
