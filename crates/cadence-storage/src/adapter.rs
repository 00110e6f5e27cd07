// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`ReplyStore`] implementation over the SQLite query modules.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use cadence_config::model::StorageConfig;
use cadence_core::traits::store::ReplyStore;
use cadence_core::types::{
    Counterpart, CounterpartId, OrchestratorStats, ReplyId, ScheduledReply,
};
use cadence_core::CadenceError;

use crate::database::Database;
use crate::queries::{counterparts, replies};

/// SQLite-backed reply and counterpart store.
pub struct SqliteReplyStore {
    db: Database,
}

impl SqliteReplyStore {
    /// Opens the store at the configured database path, running migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, CadenceError> {
        let db = Database::open_with_wal(&config.database_path, config.wal_mode).await?;
        Ok(Self { db })
    }

    /// Wraps an already-open database (used by tests sharing one temp file).
    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    /// Closes the underlying connection.
    pub async fn close(self) -> Result<(), CadenceError> {
        self.db.close().await
    }
}

#[async_trait]
impl ReplyStore for SqliteReplyStore {
    async fn insert_reply_if_absent(
        &self,
        reply: &ScheduledReply,
    ) -> Result<ScheduledReply, CadenceError> {
        replies::insert_if_absent(&self.db, reply).await
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: Duration,
    ) -> Result<Vec<ScheduledReply>, CadenceError> {
        replies::claim_due(&self.db, now, lease).await
    }

    async fn claim_one(
        &self,
        id: &ReplyId,
        now: DateTime<Utc>,
        lease: Duration,
    ) -> Result<Option<ScheduledReply>, CadenceError> {
        replies::claim_one(&self.db, id, now, lease).await
    }

    async fn mark_sent(&self, id: &ReplyId, at: DateTime<Utc>) -> Result<(), CadenceError> {
        replies::mark_sent(&self.db, id, at).await
    }

    async fn mark_failed(&self, id: &ReplyId, reason: &str) -> Result<(), CadenceError> {
        replies::mark_failed(&self.db, id, reason, Utc::now()).await
    }

    async fn get_reply(&self, id: &ReplyId) -> Result<Option<ScheduledReply>, CadenceError> {
        replies::get(&self.db, id).await
    }

    async fn reply_stats(&self, now: DateTime<Utc>) -> Result<OrchestratorStats, CadenceError> {
        replies::stats(&self.db, now).await
    }

    async fn touch_counterpart_inbound(
        &self,
        id: &CounterpartId,
        handle: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Option<Counterpart>, CadenceError> {
        counterparts::touch_inbound(&self.db, id, handle, at).await
    }

    async fn record_counterpart_outbound(
        &self,
        id: &CounterpartId,
        at: DateTime<Utc>,
    ) -> Result<(), CadenceError> {
        counterparts::record_outbound(&self.db, id, at).await
    }

    async fn record_counterpart_bucket(
        &self,
        id: &CounterpartId,
        bucket: &str,
    ) -> Result<(), CadenceError> {
        counterparts::record_bucket(&self.db, id, bucket).await
    }

    async fn get_counterpart(
        &self,
        id: &CounterpartId,
    ) -> Result<Option<Counterpart>, CadenceError> {
        counterparts::get(&self.db, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::types::ReplyStatus;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[tokio::test]
    async fn store_survives_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("restart.db");
        let config = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        };
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        let reply = ScheduledReply {
            id: ReplyId("r1".into()),
            counterpart_id: CounterpartId("cp-1".into()),
            review_key: "review-1".into(),
            text: "see you tomorrow".into(),
            created_at: now,
            send_at: now + chrono::Duration::minutes(5),
            status: ReplyStatus::Pending,
            sent_at: None,
            failure: None,
        };

        // Schedule, then "crash" by closing the store.
        let store = SqliteReplyStore::open(&config).await.unwrap();
        store.insert_reply_if_absent(&reply).await.unwrap();
        store.close().await.unwrap();

        // A fresh process sees the pending record with the original send_at.
        let store = SqliteReplyStore::open(&config).await.unwrap();
        let recovered = store.get_reply(&ReplyId("r1".into())).await.unwrap().unwrap();
        assert_eq!(recovered.status, ReplyStatus::Pending);
        assert_eq!(recovered.send_at, reply.send_at);
        store.close().await.unwrap();
    }
}
