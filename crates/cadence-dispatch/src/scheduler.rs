// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The delivery scheduler: write-once send times, claim-then-deliver sweeps,
//! and the operator force-send override.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use cadence_config::model::DispatchConfig;
use cadence_core::traits::store::ReplyStore;
use cadence_core::traits::transport::MessageSender;
use cadence_core::types::{
    CounterpartId, DeliveryOutcome, ReplyId, ReplyStatus, ScheduledReply,
};
use cadence_core::CadenceError;

/// Turns an approved reply into a durable, exactly-once future send.
///
/// All status transitions go through the store's atomic claim: a record is
/// delivered by whichever caller (timer sweep or manual override) wins the
/// claim, and by no one else.
pub struct DeliveryScheduler {
    store: Arc<dyn ReplyStore>,
    sender: Arc<dyn MessageSender>,
    claim_lease: Duration,
}

impl DeliveryScheduler {
    pub fn new(
        config: &DispatchConfig,
        store: Arc<dyn ReplyStore>,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        Self {
            store,
            sender,
            claim_lease: Duration::from_secs(config.claim_lease_secs),
        }
    }

    /// Persists `send_at = now + delay` exactly once for the given logical
    /// review item.
    ///
    /// If a record already exists for `review_key` -- a UI refresh or a
    /// re-delivered approval event -- the existing record comes back with its
    /// original send time; the delay argument is ignored rather than letting
    /// the send time drift forward.
    pub async fn schedule(
        &self,
        counterpart_id: &CounterpartId,
        review_key: &str,
        text: &str,
        delay: Duration,
    ) -> Result<ScheduledReply, CadenceError> {
        let now = Utc::now();
        let candidate = ScheduledReply {
            id: ReplyId(uuid::Uuid::new_v4().to_string()),
            counterpart_id: counterpart_id.clone(),
            review_key: review_key.to_string(),
            text: text.to_string(),
            created_at: now,
            send_at: now + chrono::Duration::seconds(delay.as_secs() as i64),
            status: ReplyStatus::Pending,
            sent_at: None,
            failure: None,
        };

        let stored = self.store.insert_reply_if_absent(&candidate).await?;
        if stored.id == candidate.id {
            info!(
                reply_id = %stored.id,
                counterpart_id = %stored.counterpart_id,
                send_at = %stored.send_at,
                "reply scheduled"
            );
        } else {
            debug!(
                reply_id = %stored.id,
                review_key,
                "schedule attempt matched existing record, keeping original send_at"
            );
        }
        Ok(stored)
    }

    /// One sweep pass: claims every due pending record and attempts delivery.
    ///
    /// Safe to run concurrently with itself -- the atomic claim hands each
    /// record to exactly one caller per lease period. A failed delivery marks
    /// that record failed and never blocks the rest of the sweep.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<Vec<DeliveryOutcome>, CadenceError> {
        let due = self.store.claim_due(now, self.claim_lease).await?;
        if due.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = due.len(), "claimed due replies");
        let mut outcomes = Vec::with_capacity(due.len());
        for reply in due {
            outcomes.push(self.deliver(reply).await);
        }
        Ok(outcomes)
    }

    /// Operator override: deliver a pending record immediately, regardless of
    /// its send time.
    ///
    /// Claims through the same path as the sweep, so racing the timer cannot
    /// double-send. Returns `None` when the record is missing, already
    /// terminal, or claimed by a concurrent caller.
    pub async fn force_send_now(
        &self,
        id: &ReplyId,
    ) -> Result<Option<DeliveryOutcome>, CadenceError> {
        match self.store.claim_one(id, Utc::now(), self.claim_lease).await? {
            Some(reply) => {
                info!(reply_id = %id, "operator forced immediate delivery");
                Ok(Some(self.deliver(reply).await))
            }
            None => {
                debug!(reply_id = %id, "force-send found no claimable record");
                Ok(None)
            }
        }
    }

    /// Attempts delivery of one claimed record and records the terminal
    /// transition.
    async fn deliver(&self, reply: ScheduledReply) -> DeliveryOutcome {
        match self.sender.send(&reply.counterpart_id, &reply.text).await {
            Ok(()) => {
                let sent_at = Utc::now();
                if let Err(e) = self.store.mark_sent(&reply.id, sent_at).await {
                    warn!(reply_id = %reply.id, error = %e, "failed to record sent status");
                }
                if let Err(e) = self
                    .store
                    .record_counterpart_outbound(&reply.counterpart_id, sent_at)
                    .await
                {
                    warn!(
                        counterpart_id = %reply.counterpart_id,
                        error = %e,
                        "failed to record outbound time"
                    );
                }
                info!(
                    reply_id = %reply.id,
                    counterpart_id = %reply.counterpart_id,
                    "reply delivered"
                );
                DeliveryOutcome {
                    reply_id: reply.id,
                    counterpart_id: reply.counterpart_id,
                    delivered: true,
                    error: None,
                }
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(
                    reply_id = %reply.id,
                    counterpart_id = %reply.counterpart_id,
                    error = %reason,
                    "delivery failed"
                );
                if let Err(e) = self.store.mark_failed(&reply.id, &reason).await {
                    warn!(reply_id = %reply.id, error = %e, "failed to record failed status");
                }
                DeliveryOutcome {
                    reply_id: reply.id,
                    counterpart_id: reply.counterpart_id,
                    delivered: false,
                    error: Some(reason),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cadence_config::model::StorageConfig;
    use cadence_storage::SqliteReplyStore;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::tempdir;
    use tokio::sync::Mutex;

    /// Sender that records every delivery and can be switched to fail.
    struct RecordingSender {
        sent: Mutex<Vec<(String, String)>>,
        fail: AtomicBool,
    }

    impl RecordingSender {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
            })
        }

        fn fail_next_sends(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        async fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().await.clone()
        }
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send(
            &self,
            counterpart_id: &CounterpartId,
            text: &str,
        ) -> Result<(), CadenceError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(CadenceError::Delivery {
                    message: "transport unavailable".to_string(),
                    source: None,
                });
            }
            self.sent
                .lock()
                .await
                .push((counterpart_id.0.clone(), text.to_string()));
            Ok(())
        }
    }

    async fn setup() -> (Arc<DeliveryScheduler>, Arc<RecordingSender>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("dispatch.db").to_string_lossy().into_owned(),
            wal_mode: true,
        };
        let store: Arc<dyn ReplyStore> =
            Arc::new(SqliteReplyStore::open(&config).await.unwrap());
        let sender = RecordingSender::new();
        let scheduler = Arc::new(DeliveryScheduler::new(
            &DispatchConfig::default(),
            store,
            sender.clone(),
        ));
        (scheduler, sender, dir)
    }

    fn cp(id: &str) -> CounterpartId {
        CounterpartId(id.to_string())
    }

    #[tokio::test]
    async fn schedule_sets_send_at_from_delay_once() {
        let (scheduler, _sender, _dir) = setup().await;

        let reply = scheduler
            .schedule(&cp("cp-1"), "review-1", "hello", Duration::from_secs(300))
            .await
            .unwrap();
        assert_eq!(reply.status, ReplyStatus::Pending);
        assert_eq!(
            (reply.send_at - reply.created_at).num_seconds(),
            300,
            "send_at is created_at + delay"
        );
    }

    #[tokio::test]
    async fn duplicate_schedule_keeps_original_send_time() {
        let (scheduler, _sender, _dir) = setup().await;

        let first = scheduler
            .schedule(&cp("cp-1"), "review-1", "hello", Duration::from_secs(60))
            .await
            .unwrap();

        // Same review item re-scheduled with a much longer delay.
        let second = scheduler
            .schedule(&cp("cp-1"), "review-1", "hello", Duration::from_secs(7200))
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.send_at, first.send_at, "send_at must not drift");
    }

    #[tokio::test]
    async fn sweep_delivers_due_records() {
        let (scheduler, sender, _dir) = setup().await;

        scheduler
            .schedule(&cp("cp-1"), "k1", "first", Duration::ZERO)
            .await
            .unwrap();
        scheduler
            .schedule(&cp("cp-2"), "k2", "second", Duration::ZERO)
            .await
            .unwrap();
        // Not due for another hour.
        scheduler
            .schedule(&cp("cp-3"), "k3", "later", Duration::from_secs(3600))
            .await
            .unwrap();

        let outcomes = scheduler.sweep(Utc::now()).await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.delivered));

        let sent = sender.sent().await;
        assert_eq!(sent.len(), 2);
    }

    #[tokio::test]
    async fn failed_delivery_marks_record_and_spares_the_rest() {
        let (scheduler, sender, _dir) = setup().await;

        scheduler
            .schedule(&cp("cp-1"), "k1", "will fail", Duration::ZERO)
            .await
            .unwrap();

        sender.fail_next_sends(true);
        let outcomes = scheduler.sweep(Utc::now()).await.unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].delivered);
        assert!(outcomes[0].error.as_deref().unwrap().contains("transport"));

        sender.fail_next_sends(false);

        // The failed record is terminal: a later sweep must not retry it.
        let outcomes = scheduler.sweep(Utc::now()).await.unwrap();
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn concurrent_sweeps_deliver_each_record_once() {
        let (scheduler, sender, _dir) = setup().await;

        for i in 0..6 {
            scheduler
                .schedule(&cp(&format!("cp-{i}")), &format!("k{i}"), "hi", Duration::ZERO)
                .await
                .unwrap();
        }

        let now = Utc::now();
        let (a, b) = tokio::join!(scheduler.sweep(now), scheduler.sweep(now));
        let total = a.unwrap().len() + b.unwrap().len();
        assert_eq!(total, 6, "each record claimed by exactly one sweep");
        assert_eq!(sender.sent().await.len(), 6, "exactly one send per record");
    }

    #[tokio::test]
    async fn force_send_now_delivers_before_due_time() {
        let (scheduler, sender, _dir) = setup().await;

        let reply = scheduler
            .schedule(&cp("cp-1"), "k1", "urgent", Duration::from_secs(86_400))
            .await
            .unwrap();

        let outcome = scheduler.force_send_now(&reply.id).await.unwrap().unwrap();
        assert!(outcome.delivered);
        assert_eq!(sender.sent().await.len(), 1);

        // The normal sweep path finds nothing left to do.
        let outcomes = scheduler.sweep(Utc::now() + chrono::Duration::days(2)).await;
        assert!(outcomes.unwrap().is_empty());
    }

    #[tokio::test]
    async fn force_send_on_terminal_record_is_none() {
        let (scheduler, _sender, _dir) = setup().await;

        let reply = scheduler
            .schedule(&cp("cp-1"), "k1", "hi", Duration::ZERO)
            .await
            .unwrap();
        scheduler.sweep(Utc::now()).await.unwrap();

        let outcome = scheduler.force_send_now(&reply.id).await.unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn force_send_on_unknown_record_is_none() {
        let (scheduler, _sender, _dir) = setup().await;
        let outcome = scheduler
            .force_send_now(&ReplyId("ghost".into()))
            .await
            .unwrap();
        assert!(outcome.is_none());
    }
}
