// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage trait for scheduled replies and counterpart timing records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::CadenceError;
use crate::types::{
    Counterpart, CounterpartId, OrchestratorStats, ReplyId, ScheduledReply,
};

/// Durable store backing the delivery scheduler and the counterpart registry.
///
/// Implementations must serialize writes so that [`claim_due`] and
/// [`claim_one`] are atomic with respect to concurrent sweepers: a record is
/// handed to exactly one caller per lease period.
///
/// [`claim_due`]: ReplyStore::claim_due
/// [`claim_one`]: ReplyStore::claim_one
#[async_trait]
pub trait ReplyStore: Send + Sync {
    /// Persists a new scheduled reply unless one already exists for the same
    /// `review_key`, in which case the existing record is returned untouched.
    ///
    /// This is the idempotency guarantee that keeps `send_at` write-once: a
    /// duplicate schedule attempt never recomputes the delay.
    async fn insert_reply_if_absent(
        &self,
        reply: &ScheduledReply,
    ) -> Result<ScheduledReply, CadenceError>;

    /// Atomically claims all pending replies whose `send_at` is due, ordered
    /// by `send_at` ascending. Claimed records carry a lease; a claim left by
    /// a crashed process expires after `lease` and the record becomes
    /// claimable again.
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: Duration,
    ) -> Result<Vec<ScheduledReply>, CadenceError>;

    /// Atomically claims one specific pending reply regardless of its
    /// `send_at` (operator override). Returns `None` when the record is
    /// missing, already terminal, or currently claimed elsewhere.
    async fn claim_one(
        &self,
        id: &ReplyId,
        now: DateTime<Utc>,
        lease: Duration,
    ) -> Result<Option<ScheduledReply>, CadenceError>;

    /// Transitions a pending reply to sent. A no-op on terminal records.
    async fn mark_sent(&self, id: &ReplyId, at: DateTime<Utc>) -> Result<(), CadenceError>;

    /// Transitions a pending reply to failed with a reason. A no-op on
    /// terminal records.
    async fn mark_failed(&self, id: &ReplyId, reason: &str) -> Result<(), CadenceError>;

    /// Fetches a reply by id.
    async fn get_reply(&self, id: &ReplyId) -> Result<Option<ScheduledReply>, CadenceError>;

    /// Aggregates pending/sent/failed counts and the next due send time.
    async fn reply_stats(&self, now: DateTime<Utc>) -> Result<OrchestratorStats, CadenceError>;

    /// Records an inbound arrival, creating the counterpart on first contact.
    /// Returns the record state *prior* to this touch (`None` when the
    /// counterpart was just created) so callers can make day-boundary and
    /// pacing decisions from pre-arrival state.
    async fn touch_counterpart_inbound(
        &self,
        id: &CounterpartId,
        handle: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Option<Counterpart>, CadenceError>;

    /// Records a successful outbound send for pacing of the next reply.
    async fn record_counterpart_outbound(
        &self,
        id: &CounterpartId,
        at: DateTime<Utc>,
    ) -> Result<(), CadenceError>;

    /// Records the most recent response-bucket label for CRM-style tagging.
    async fn record_counterpart_bucket(
        &self,
        id: &CounterpartId,
        bucket: &str,
    ) -> Result<(), CadenceError>;

    /// Fetches a counterpart record by id.
    async fn get_counterpart(
        &self,
        id: &CounterpartId,
    ) -> Result<Option<Counterpart>, CadenceError>;
}
