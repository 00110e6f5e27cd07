// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Orchestrator wiring for the Cadence response orchestrator.
//!
//! The [`Orchestrator`] is the composition root that ties the pieces
//! together per inbound event:
//! 1. Touch the counterpart's timing record (first contact creates it)
//! 2. Append the fragment to the per-counterpart [`DebounceBuffer`],
//!    choosing the steady or cold-open quiet window
//! 3. On window expiry, resolve the conversation stage, generate reply text
//!    through the backend chain, and classify the response bucket
//! 4. Schedule paced delivery (auto mode) or enqueue for manual review
//!
//! Cancellation is structured: a new fragment supersedes both a pending
//! window and an in-flight generation, and shutdown drains every live task.

pub mod debounce;
mod process;
pub mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use cadence_config::model::CadenceConfig;
use cadence_core::traits::conversation::{
    HistoryProvider, PromptBuilder, ReplyPolicy, ReviewQueue, StageResolver,
};
use cadence_core::traits::store::ReplyStore;
use cadence_core::types::{
    Counterpart, CounterpartId, DeliveryOutcome, InboundFragment, OrchestratorStats, ReplyId,
};
use cadence_core::CadenceError;
use cadence_dispatch::DeliveryScheduler;
use cadence_generate::RetryingGenerator;
use cadence_pacing::PacingPolicy;

pub use debounce::{DebounceBuffer, WindowHandler};

use process::ReplyPipeline;

/// Composition root for the conversation response pipeline.
pub struct Orchestrator {
    buffer: DebounceBuffer,
    scheduler: Arc<DeliveryScheduler>,
    store: Arc<dyn ReplyStore>,
    quiet_window: Duration,
    cold_open_window: Duration,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &CadenceConfig,
        store: Arc<dyn ReplyStore>,
        generator: Arc<RetryingGenerator>,
        scheduler: Arc<DeliveryScheduler>,
        stage_resolver: Arc<dyn StageResolver>,
        prompt_builder: Arc<dyn PromptBuilder>,
        history: Arc<dyn HistoryProvider>,
        policy: Arc<dyn ReplyPolicy>,
        review_queue: Arc<dyn ReviewQueue>,
    ) -> Self {
        let pipeline = Arc::new(ReplyPipeline {
            store: store.clone(),
            stage_resolver,
            prompt_builder,
            history,
            policy,
            review_queue,
            generator,
            pacing: PacingPolicy::new(&config.pacing),
            scheduler: scheduler.clone(),
        });

        let handler: WindowHandler = Arc::new(move |combined, cancel| {
            let pipeline = Arc::clone(&pipeline);
            Box::pin(async move { pipeline.process(combined, cancel).await })
        });

        Self {
            buffer: DebounceBuffer::new(handler),
            scheduler,
            store,
            quiet_window: Duration::from_secs(config.debounce.quiet_window_secs),
            cold_open_window: Duration::from_secs(config.debounce.cold_open_window_secs),
        }
    }

    /// Transport entry point: one inbound message fragment.
    pub async fn on_inbound_fragment(
        &self,
        counterpart_id: CounterpartId,
        text: String,
        arrived_at: DateTime<Utc>,
    ) -> Result<(), CadenceError> {
        self.on_inbound(
            counterpart_id,
            None,
            InboundFragment {
                text,
                media: None,
                arrived_at,
            },
        )
        .await
    }

    /// Full-fidelity entry point with an optional display handle and media
    /// descriptor.
    pub async fn on_inbound(
        &self,
        counterpart_id: CounterpartId,
        handle: Option<&str>,
        fragment: InboundFragment,
    ) -> Result<(), CadenceError> {
        let previous = self
            .store
            .touch_counterpart_inbound(&counterpart_id, handle, fragment.arrived_at)
            .await?;

        let window = select_window(
            self.quiet_window,
            self.cold_open_window,
            previous.as_ref(),
            fragment.arrived_at,
        );
        debug!(
            counterpart_id = %counterpart_id,
            window_secs = window.as_secs(),
            "fragment accepted"
        );

        self.buffer.append(counterpart_id, fragment, window).await;
        Ok(())
    }

    /// Operator override: deliver a pending scheduled reply immediately.
    pub async fn force_send_now(
        &self,
        reply_id: &ReplyId,
    ) -> Result<Option<DeliveryOutcome>, CadenceError> {
        self.scheduler.force_send_now(reply_id).await
    }

    /// Read-only status snapshot for dashboards.
    pub async fn stats(&self) -> Result<OrchestratorStats, CadenceError> {
        self.store.reply_stats(Utc::now()).await
    }

    /// The delivery scheduler, for wiring a [`Sweeper`] next to this
    /// orchestrator.
    ///
    /// [`Sweeper`]: cadence_dispatch::Sweeper
    pub fn scheduler(&self) -> Arc<DeliveryScheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Number of fragments currently buffered for a counterpart.
    pub async fn pending_fragments(&self, counterpart_id: &CounterpartId) -> usize {
        self.buffer.pending_fragments(counterpart_id).await
    }

    /// Cancels every pending window and in-flight cycle. Unflushed fragments
    /// are dropped; the counterpart will resend or write again.
    pub async fn shutdown(&self) {
        self.buffer.shutdown().await;
    }
}

/// Picks the quiet window for a fragment: the longer cold-open window when
/// the counterpart has not written yet today (or ever), the steady window
/// otherwise.
fn select_window(
    quiet: Duration,
    cold_open: Duration,
    previous: Option<&Counterpart>,
    arrived_at: DateTime<Utc>,
) -> Duration {
    let wrote_today = previous
        .and_then(|c| c.last_inbound_at)
        .is_some_and(|t| t.date_naive() == arrived_at.date_naive());

    if wrote_today {
        quiet
    } else {
        cold_open
    }
}
