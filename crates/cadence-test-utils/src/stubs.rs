// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stub implementations of the conversation-side collaborator seams.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use cadence_core::traits::conversation::{
    HistoryProvider, PromptBuilder, ReplyPolicy, ReviewQueue, StageResolver,
};
use cadence_core::types::{
    CombinedMessage, CounterpartId, HistoryEntry, StageToken,
};
use cadence_core::CadenceError;

/// Stage resolver that always returns the same token.
pub struct StaticStageResolver {
    token: StageToken,
}

impl StaticStageResolver {
    pub fn new(label: &str) -> Arc<Self> {
        Arc::new(Self {
            token: StageToken {
                label: label.to_string(),
                scenario: None,
            },
        })
    }
}

#[async_trait]
impl StageResolver for StaticStageResolver {
    async fn resolve(&self, _counterpart_id: &CounterpartId) -> Result<StageToken, CadenceError> {
        Ok(self.token.clone())
    }
}

/// Deterministic prompt builder that exposes its inputs in the output so
/// tests can assert what the generator was given.
pub struct TemplatePromptBuilder;

impl TemplatePromptBuilder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl PromptBuilder for TemplatePromptBuilder {
    fn build(
        &self,
        combined: &CombinedMessage,
        stage: &StageToken,
        history: &[HistoryEntry],
    ) -> String {
        format!(
            "stage={}; history={}; message={}",
            stage.label,
            history.len(),
            combined.text
        )
    }
}

/// History provider that returns a fixed list of entries.
pub struct StaticHistory {
    entries: Vec<HistoryEntry>,
}

impl StaticHistory {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self { entries: Vec::new() })
    }

    pub fn with_entries(entries: Vec<HistoryEntry>) -> Arc<Self> {
        Arc::new(Self { entries })
    }
}

#[async_trait]
impl HistoryProvider for StaticHistory {
    async fn history(
        &self,
        _counterpart_id: &CounterpartId,
    ) -> Result<Vec<HistoryEntry>, CadenceError> {
        Ok(self.entries.clone())
    }
}

/// Reply policy with a toggleable auto-mode flag.
pub struct StaticReplyPolicy {
    auto: AtomicBool,
}

impl StaticReplyPolicy {
    pub fn new(auto: bool) -> Arc<Self> {
        Arc::new(Self {
            auto: AtomicBool::new(auto),
        })
    }

    pub fn set_auto(&self, auto: bool) {
        self.auto.store(auto, Ordering::SeqCst);
    }
}

#[async_trait]
impl ReplyPolicy for StaticReplyPolicy {
    async fn auto_mode_enabled(&self, _counterpart_id: &CounterpartId) -> bool {
        self.auto.load(Ordering::SeqCst)
    }
}

/// Review queue that records everything it receives.
pub struct RecordingReviewQueue {
    entries: Mutex<Vec<(CounterpartId, String, String)>>,
}

impl RecordingReviewQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(Vec::new()),
        })
    }

    /// Recorded `(counterpart, generated_text, prompt)` triples.
    pub async fn entries(&self) -> Vec<(CounterpartId, String, String)> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl ReviewQueue for RecordingReviewQueue {
    async fn enqueue(
        &self,
        counterpart_id: &CounterpartId,
        generated_text: &str,
        prompt: &str,
    ) -> Result<(), CadenceError> {
        self.entries.lock().await.push((
            counterpart_id.clone(),
            generated_text.to_string(),
            prompt.to_string(),
        ));
        Ok(())
    }
}
