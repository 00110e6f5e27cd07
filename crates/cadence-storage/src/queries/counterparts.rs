// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Counterpart timing-record operations.

use cadence_core::types::{Counterpart, CounterpartId};
use cadence_core::CadenceError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::database::{map_tr_err, Database};
use crate::models::{fmt_ts, parse_opt_ts, parse_ts};

const COUNTERPART_COLUMNS: &str =
    "id, handle, first_seen_at, last_inbound_at, last_outbound_at, last_bucket";

fn row_to_counterpart(row: &Row<'_>) -> Result<Counterpart, rusqlite::Error> {
    let first_seen_at: String = row.get(2)?;
    let last_inbound_at: Option<String> = row.get(3)?;
    let last_outbound_at: Option<String> = row.get(4)?;

    Ok(Counterpart {
        id: CounterpartId(row.get(0)?),
        handle: row.get(1)?,
        first_seen_at: parse_ts(2, &first_seen_at)?,
        last_inbound_at: parse_opt_ts(3, last_inbound_at.as_deref())?,
        last_outbound_at: parse_opt_ts(4, last_outbound_at.as_deref())?,
        last_bucket: row.get(5)?,
    })
}

/// Records an inbound arrival, creating the counterpart on first contact.
///
/// Returns the record state *before* this touch (`None` when the counterpart
/// was just created), so callers can make day-boundary and pacing decisions
/// from pre-arrival state in the same atomic step.
pub async fn touch_inbound(
    db: &Database,
    id: &CounterpartId,
    handle: Option<&str>,
    at: DateTime<Utc>,
) -> Result<Option<Counterpart>, CadenceError> {
    let id = id.0.clone();
    let handle = handle.map(str::to_string);
    let at_s = fmt_ts(at);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let previous = match tx.query_row(
                &format!("SELECT {COUNTERPART_COLUMNS} FROM counterparts WHERE id = ?1"),
                params![id],
                row_to_counterpart,
            ) {
                Ok(existing) => Some(existing),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e),
            };

            match &previous {
                Some(_) => {
                    tx.execute(
                        "UPDATE counterparts
                         SET last_inbound_at = ?2, handle = COALESCE(?3, handle)
                         WHERE id = ?1",
                        params![id, at_s, handle],
                    )?;
                }
                None => {
                    tx.execute(
                        "INSERT INTO counterparts (id, handle, first_seen_at, last_inbound_at)
                         VALUES (?1, ?2, ?3, ?3)",
                        params![id, handle, at_s],
                    )?;
                }
            }

            tx.commit()?;
            Ok(previous)
        })
        .await
        .map_err(map_tr_err)
}

/// Records a successful outbound send, used to pace the next reply.
pub async fn record_outbound(
    db: &Database,
    id: &CounterpartId,
    at: DateTime<Utc>,
) -> Result<(), CadenceError> {
    let id = id.0.clone();
    let at_s = fmt_ts(at);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE counterparts SET last_outbound_at = ?2 WHERE id = ?1",
                params![id, at_s],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Records the most recent response-bucket label for CRM-style tagging.
pub async fn record_bucket(
    db: &Database,
    id: &CounterpartId,
    bucket: &str,
) -> Result<(), CadenceError> {
    let id = id.0.clone();
    let bucket = bucket.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE counterparts SET last_bucket = ?2 WHERE id = ?1",
                params![id, bucket],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetches a counterpart record by id.
pub async fn get(
    db: &Database,
    id: &CounterpartId,
) -> Result<Option<Counterpart>, CadenceError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {COUNTERPART_COLUMNS} FROM counterparts WHERE id = ?1"),
                params![id],
                row_to_counterpart,
            );
            match result {
                Ok(cp) => Ok(Some(cp)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("counterparts_test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn first_touch_creates_record_and_returns_none() {
        let (db, _dir) = setup_db().await;
        let id = CounterpartId("cp-1".into());

        let previous = touch_inbound(&db, &id, Some("@lena"), at(0)).await.unwrap();
        assert!(previous.is_none(), "first contact has no prior state");

        let cp = get(&db, &id).await.unwrap().unwrap();
        assert_eq!(cp.handle.as_deref(), Some("@lena"));
        assert_eq!(cp.first_seen_at, at(0));
        assert_eq!(cp.last_inbound_at, Some(at(0)));
        assert!(cp.last_outbound_at.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn second_touch_returns_previous_state() {
        let (db, _dir) = setup_db().await;
        let id = CounterpartId("cp-1".into());

        touch_inbound(&db, &id, None, at(0)).await.unwrap();
        let previous = touch_inbound(&db, &id, None, at(100)).await.unwrap().unwrap();
        assert_eq!(previous.last_inbound_at, Some(at(0)));

        let cp = get(&db, &id).await.unwrap().unwrap();
        assert_eq!(cp.last_inbound_at, Some(at(100)));
        assert_eq!(cp.first_seen_at, at(0), "first_seen_at is immutable");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn touch_keeps_existing_handle_when_new_is_absent() {
        let (db, _dir) = setup_db().await;
        let id = CounterpartId("cp-1".into());

        touch_inbound(&db, &id, Some("@lena"), at(0)).await.unwrap();
        touch_inbound(&db, &id, None, at(50)).await.unwrap();

        let cp = get(&db, &id).await.unwrap().unwrap();
        assert_eq!(cp.handle.as_deref(), Some("@lena"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn outbound_and_bucket_are_recorded() {
        let (db, _dir) = setup_db().await;
        let id = CounterpartId("cp-1".into());

        touch_inbound(&db, &id, None, at(0)).await.unwrap();
        record_outbound(&db, &id, at(200)).await.unwrap();
        record_bucket(&db, &id, "30-60m").await.unwrap();

        let cp = get(&db, &id).await.unwrap().unwrap();
        assert_eq!(cp.last_outbound_at, Some(at(200)));
        assert_eq!(cp.last_bucket.as_deref(), Some("30-60m"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_unknown_counterpart_returns_none() {
        let (db, _dir) = setup_db().await;
        let cp = get(&db, &CounterpartId("ghost".into())).await.unwrap();
        assert!(cp.is_none());
        db.close().await.unwrap();
    }
}
