// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `Harness` assembles a complete orchestrator stack -- temp SQLite store,
//! mock backend chain, mock transport, stub collaborators -- and exposes the
//! pieces for assertions. Drive it with `send_fragment`, advance the (paused)
//! tokio clock past the debounce window, then inspect the scheduled replies,
//! the review queue, or the mock sender.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use cadence_agent::Orchestrator;
use cadence_config::model::{CadenceConfig, PacingConfig, StorageConfig};
use cadence_core::traits::backend::GenerationBackend;
use cadence_core::traits::store::ReplyStore;
use cadence_core::types::{CounterpartId, DeliveryOutcome, OrchestratorStats};
use cadence_core::CadenceError;
use cadence_dispatch::DeliveryScheduler;
use cadence_generate::RetryingGenerator;
use cadence_storage::SqliteReplyStore;

use crate::mock_backend::{MockBackend, ScriptedOutcome};
use crate::mock_sender::MockSender;
use crate::stubs::{
    RecordingReviewQueue, StaticHistory, StaticReplyPolicy, StaticStageResolver,
    TemplatePromptBuilder,
};

/// Builder for creating test environments with configurable options.
pub struct HarnessBuilder {
    responses: Vec<String>,
    auto_mode: bool,
    quiet_window_secs: u64,
    cold_open_window_secs: u64,
    pacing: Option<PacingConfig>,
}

impl HarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            auto_mode: true,
            quiet_window_secs: 15,
            cold_open_window_secs: 15,
            pacing: None,
        }
    }

    /// Pre-load backend reply texts, returned FIFO.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Enable or disable automatic dispatch (default: enabled).
    pub fn with_auto_mode(mut self, auto: bool) -> Self {
        self.auto_mode = auto;
        self
    }

    /// Steady-state quiet window (default 15s for fast tests).
    pub fn with_quiet_window_secs(mut self, secs: u64) -> Self {
        self.quiet_window_secs = secs;
        self
    }

    /// Cold-open quiet window (default equals the steady window so tests
    /// opt into the longer first-contact batching explicitly).
    pub fn with_cold_open_window_secs(mut self, secs: u64) -> Self {
        self.cold_open_window_secs = secs;
        self
    }

    /// Override the pacing section.
    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = Some(pacing);
        self
    }

    /// Build the harness, creating all required subsystems.
    pub async fn build(self) -> Result<Harness, CadenceError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| CadenceError::Storage {
            source: e.into(),
        })?;
        let db_path = temp_dir.path().join("harness.db");

        let mut config = CadenceConfig::default();
        config.debounce.quiet_window_secs = self.quiet_window_secs;
        config.debounce.cold_open_window_secs = self.cold_open_window_secs;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        };
        if let Some(pacing) = self.pacing {
            config.pacing = pacing;
        }

        let store: Arc<dyn ReplyStore> =
            Arc::new(SqliteReplyStore::open(&config.storage).await?);

        let backend = if self.responses.is_empty() {
            MockBackend::new("mock-primary")
        } else {
            MockBackend::with_script(
                "mock-primary",
                self.responses.into_iter().map(ScriptedOutcome::Reply).collect(),
            )
        };
        let generator = Arc::new(RetryingGenerator::new(
            &config.generation,
            vec![backend.clone() as Arc<dyn GenerationBackend>],
        ));

        let sender = MockSender::new();
        let scheduler = Arc::new(DeliveryScheduler::new(
            &config.dispatch,
            store.clone(),
            sender.clone(),
        ));

        let policy = StaticReplyPolicy::new(self.auto_mode);
        let review_queue = RecordingReviewQueue::new();

        let orchestrator = Arc::new(Orchestrator::new(
            &config,
            store.clone(),
            generator,
            scheduler.clone(),
            StaticStageResolver::new("warmup"),
            TemplatePromptBuilder::new(),
            StaticHistory::empty(),
            policy.clone(),
            review_queue.clone(),
        ));

        Ok(Harness {
            backend,
            sender,
            review_queue,
            policy,
            store,
            scheduler,
            orchestrator,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment over mock adapters and temp storage.
pub struct Harness {
    /// The primary mock generation backend.
    pub backend: Arc<MockBackend>,
    /// The mock outbound transport.
    pub sender: Arc<MockSender>,
    /// Recording manual-review queue.
    pub review_queue: Arc<RecordingReviewQueue>,
    /// Toggleable auto-mode policy.
    pub policy: Arc<StaticReplyPolicy>,
    /// SQLite store (temp DB, cleaned up on drop).
    pub store: Arc<dyn ReplyStore>,
    /// The delivery scheduler (for explicit sweeps in tests).
    pub scheduler: Arc<DeliveryScheduler>,
    /// The orchestrator under test.
    pub orchestrator: Arc<Orchestrator>,
    /// Effective configuration.
    pub config: CadenceConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl Harness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::new()
    }

    /// Feed one inbound fragment with an explicit arrival time.
    pub async fn send_fragment_at(
        &self,
        counterpart: &str,
        text: &str,
        arrived_at: DateTime<Utc>,
    ) -> Result<(), CadenceError> {
        self.orchestrator
            .on_inbound_fragment(CounterpartId(counterpart.to_string()), text.to_string(), arrived_at)
            .await?;
        // Let the freshly spawned debounce window task run once so it arms its
        // sleep timer before a paused-clock test advances time; otherwise the
        // timer is registered against the already-advanced clock and never
        // fires within the test's polling budget.
        tokio::task::yield_now().await;
        Ok(())
    }

    /// Feed one inbound fragment arriving now.
    pub async fn send_fragment(&self, counterpart: &str, text: &str) -> Result<(), CadenceError> {
        self.send_fragment_at(counterpart, text, Utc::now()).await
    }

    /// One explicit sweep pass at the given instant.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<Vec<DeliveryOutcome>, CadenceError> {
        self.scheduler.sweep(now).await
    }

    /// Current scheduler stats.
    pub async fn stats(&self) -> Result<OrchestratorStats, CadenceError> {
        self.store.reply_stats(Utc::now()).await
    }

    /// Polls until the pending scheduled-reply count reaches `expected`.
    ///
    /// Intended for paused-clock tests: the short sleeps auto-advance the
    /// tokio clock while the pipeline task finishes up. Panics after a
    /// bounded number of polls.
    pub async fn wait_for_pending(&self, expected: u64) {
        for _ in 0..500 {
            let stats = self.stats().await.expect("stats query failed");
            if stats.pending == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let stats = self.stats().await.expect("stats query failed");
        panic!(
            "pending count never reached {expected}; stats: {stats:?}"
        );
    }

    /// Polls until the manual-review queue holds `expected` entries.
    pub async fn wait_for_review_entries(&self, expected: usize) {
        for _ in 0..500 {
            if self.review_queue.entries().await.len() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "review queue never reached {expected} entries; got {:?}",
            self.review_queue.entries().await
        );
    }
}
