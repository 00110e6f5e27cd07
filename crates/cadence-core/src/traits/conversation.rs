// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation-side collaborator traits.
//!
//! Stage resolution, prompt assembly, conversation history, reply-mode policy,
//! and the manual-review queue are all external concerns. The orchestrator
//! passes their values through without interpreting them.

use async_trait::async_trait;

use crate::error::CadenceError;
use crate::types::{CombinedMessage, CounterpartId, HistoryEntry, StageToken};

/// Resolves the opaque conversation-stage token for a counterpart.
#[async_trait]
pub trait StageResolver: Send + Sync {
    async fn resolve(&self, counterpart_id: &CounterpartId) -> Result<StageToken, CadenceError>;
}

/// Builds the generation prompt from the combined message, stage token, and
/// conversation history.
///
/// Prompt content is authored outside this repository; this seam only fixes
/// the inputs.
pub trait PromptBuilder: Send + Sync {
    fn build(
        &self,
        combined: &CombinedMessage,
        stage: &StageToken,
        history: &[HistoryEntry],
    ) -> String;
}

/// Supplies prior conversation messages for prompt assembly.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn history(
        &self,
        counterpart_id: &CounterpartId,
    ) -> Result<Vec<HistoryEntry>, CadenceError>;
}

/// Decides whether generated replies for a counterpart are dispatched
/// automatically or routed to manual review.
#[async_trait]
pub trait ReplyPolicy: Send + Sync {
    async fn auto_mode_enabled(&self, counterpart_id: &CounterpartId) -> bool;
}

/// Receives generated replies (and their prompts) when automatic mode is off.
#[async_trait]
pub trait ReviewQueue: Send + Sync {
    async fn enqueue(
        &self,
        counterpart_id: &CounterpartId,
        generated_text: &str,
        prompt: &str,
    ) -> Result<(), CadenceError>;
}
