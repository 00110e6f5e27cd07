// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-window processing pipeline.
//!
//! Runs once per expired debounce window: resolve the conversation stage,
//! build the prompt, generate reply text through the backend chain, classify
//! the response bucket, and either schedule the reply for paced delivery or
//! hand it to the manual-review queue.
//!
//! The cancellation token is the supersession signal from the debounce
//! buffer. It is checked at every suspension point, and always immediately
//! before the single side-effecting step, so a superseded cycle never leaves
//! a partial ScheduledReply or review entry behind.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cadence_core::traits::conversation::{
    HistoryProvider, PromptBuilder, ReplyPolicy, ReviewQueue, StageResolver,
};
use cadence_core::traits::store::ReplyStore;
use cadence_core::types::CombinedMessage;
use cadence_core::CadenceError;
use cadence_dispatch::DeliveryScheduler;
use cadence_generate::RetryingGenerator;
use cadence_pacing::{PacingPolicy, ResponseBucket};

pub(crate) struct ReplyPipeline {
    pub(crate) store: Arc<dyn ReplyStore>,
    pub(crate) stage_resolver: Arc<dyn StageResolver>,
    pub(crate) prompt_builder: Arc<dyn PromptBuilder>,
    pub(crate) history: Arc<dyn HistoryProvider>,
    pub(crate) policy: Arc<dyn ReplyPolicy>,
    pub(crate) review_queue: Arc<dyn ReviewQueue>,
    pub(crate) generator: Arc<RetryingGenerator>,
    pub(crate) pacing: PacingPolicy,
    pub(crate) scheduler: Arc<DeliveryScheduler>,
}

impl ReplyPipeline {
    /// Entry point from the debounce buffer. Failures are logged and leave
    /// conversation state untouched; errors never cross counterparts.
    pub(crate) async fn process(&self, combined: CombinedMessage, cancel: CancellationToken) {
        let counterpart_id = combined.counterpart_id.clone();
        if let Err(e) = self.run(combined, cancel).await {
            warn!(
                counterpart_id = %counterpart_id,
                error = %e,
                "processing cycle failed, conversation state unchanged"
            );
        }
    }

    async fn run(
        &self,
        combined: CombinedMessage,
        cancel: CancellationToken,
    ) -> Result<(), CadenceError> {
        let cp = combined.counterpart_id.clone();

        let stage = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            resolved = self.stage_resolver.resolve(&cp) => resolved?,
        };

        let history = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            fetched = self.history.history(&cp) => fetched?,
        };

        let prompt = self.prompt_builder.build(&combined, &stage, &history);

        let output = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(counterpart_id = %cp, "superseded during generation, discarding");
                return Ok(());
            }
            generated = self.generator.generate(&prompt) => generated?,
        };

        let last_outbound_at = self
            .store
            .get_counterpart(&cp)
            .await?
            .and_then(|c| c.last_outbound_at);

        let bucket = ResponseBucket::classify(last_outbound_at, combined.last_arrived_at);
        if let Err(e) = self
            .store
            .record_counterpart_bucket(&cp, &bucket.to_string())
            .await
        {
            warn!(counterpart_id = %cp, error = %e, "failed to record response bucket");
        }

        info!(
            counterpart_id = %cp,
            bucket = %bucket,
            backend = %output.backend,
            attempts = output.attempts,
            "reply generated"
        );

        // Last cancellation check before the one side-effecting step.
        if cancel.is_cancelled() {
            debug!(counterpart_id = %cp, "superseded before dispatch, discarding");
            return Ok(());
        }

        if self.policy.auto_mode_enabled(&cp).await {
            let delay = {
                let mut rng = rand::thread_rng();
                self.pacing
                    .compute_delay(last_outbound_at, combined.last_arrived_at, &mut rng)
            };
            // One record per processed window: keyed on the window's final
            // fragment so a re-processed window cannot duplicate the send.
            let review_key = format!("auto:{}:{}", cp, combined.last_arrived_at.timestamp());
            self.scheduler
                .schedule(&cp, &review_key, &output.text, delay)
                .await?;
        } else {
            self.review_queue.enqueue(&cp, &output.text, &prompt).await?;
        }

        Ok(())
    }
}
