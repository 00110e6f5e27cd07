// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the Cadence orchestrator and its trait seams.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Stable external identifier for the remote party in a one-on-one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CounterpartId(pub String);

impl std::fmt::Display for CounterpartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a scheduled reply record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplyId(pub String);

impl std::fmt::Display for ReplyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One inbound message fragment as received from the transport layer.
///
/// Fragments are ephemeral: they live inside a debounce window until merged
/// into a [`CombinedMessage`] and are never persisted on their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFragment {
    pub text: String,
    /// Free-form descriptor for attached media, passed through untouched.
    pub media: Option<String>,
    pub arrived_at: DateTime<Utc>,
}

/// The deduplicated, chronologically ordered merge of all fragments collected
/// during one debounce window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedMessage {
    pub counterpart_id: CounterpartId,
    pub text: String,
    pub fragment_count: usize,
    /// Arrival of the first fragment; drives first-contact classification.
    pub first_arrived_at: DateTime<Utc>,
    /// Arrival of the last fragment; drives pacing calculations.
    pub last_arrived_at: DateTime<Utc>,
}

/// Opaque conversation-stage value supplied by the external stage resolver.
///
/// The orchestrator passes it through to prompt building and never interprets
/// its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageToken {
    pub label: String,
    pub scenario: Option<String>,
}

/// Successful output of the generation chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutput {
    pub text: String,
    /// Name of the backend that produced the text.
    pub backend: String,
    /// Attempts consumed across the whole chain, including failed ones.
    pub attempts: u32,
}

/// Lifecycle status of a [`ScheduledReply`].
///
/// `Pending` transitions to exactly one of `Sent` or `Failed`; terminal
/// records are never re-processed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum ReplyStatus {
    Pending,
    Sent,
    Failed,
}

/// A durable, exactly-once future send.
///
/// `send_at` is computed exactly once at creation and never recomputed; any
/// rendering layer reads it rather than re-deriving a delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledReply {
    pub id: ReplyId,
    pub counterpart_id: CounterpartId,
    /// Stable identifier of the logical review item; duplicate schedule
    /// attempts for the same key return the existing record.
    pub review_key: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub send_at: DateTime<Utc>,
    pub status: ReplyStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub failure: Option<String>,
}

/// Result of one attempted delivery during a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub reply_id: ReplyId,
    pub counterpart_id: CounterpartId,
    pub delivered: bool,
    pub error: Option<String>,
}

/// Read-only status snapshot for dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorStats {
    pub pending: u64,
    pub sent_today: u64,
    pub failed_today: u64,
    pub next_send_at: Option<DateTime<Utc>>,
}

/// Direction of a conversation history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum HistoryRole {
    Inbound,
    Outbound,
}

/// One prior message in a conversation, supplied by the external history provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Persisted timing record for one remote party.
///
/// Created on the first inbound message and never deleted by the
/// orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counterpart {
    pub id: CounterpartId,
    pub handle: Option<String>,
    pub first_seen_at: DateTime<Utc>,
    pub last_inbound_at: Option<DateTime<Utc>>,
    pub last_outbound_at: Option<DateTime<Utc>>,
    /// Display label of the most recent response bucket, kept for CRM-style
    /// tagging. Never read back for control flow.
    pub last_bucket: Option<String>,
}
