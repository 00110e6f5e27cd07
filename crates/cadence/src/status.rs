// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cadence status` command implementation.

use chrono::Utc;
use tracing::debug;

use cadence_config::CadenceConfig;
use cadence_core::traits::store::ReplyStore;
use cadence_core::CadenceError;
use cadence_storage::SqliteReplyStore;

/// Opens the configured database and prints the scheduled-reply snapshot.
pub async fn run_status(config: &CadenceConfig) -> Result<(), CadenceError> {
    debug!(path = %config.storage.database_path, "opening store for status");
    let store = SqliteReplyStore::open(&config.storage).await?;
    let stats = store.reply_stats(Utc::now()).await?;

    println!("pending replies   : {}", stats.pending);
    println!("sent today        : {}", stats.sent_today);
    println!("failed today      : {}", stats.failed_today);
    match stats.next_send_at {
        Some(at) => println!("next send at      : {at}"),
        None => println!("next send at      : -"),
    }

    store.close().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_config::model::StorageConfig;
    use tempfile::tempdir;

    #[tokio::test]
    async fn status_runs_against_empty_database() {
        let dir = tempdir().unwrap();
        let config = CadenceConfig {
            storage: StorageConfig {
                database_path: dir.path().join("status.db").to_string_lossy().into_owned(),
                wal_mode: true,
            },
            ..CadenceConfig::default()
        };
        run_status(&config).await.unwrap();
    }
}
