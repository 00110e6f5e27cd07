// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled-reply operations: idempotent creation, atomic claim, terminal
//! transitions, and dashboard stats.

use std::str::FromStr;
use std::time::Duration;

use cadence_core::types::{OrchestratorStats, ReplyId, ReplyStatus, ScheduledReply};
use cadence_core::CadenceError;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use rusqlite::{params, Row};

use crate::database::{map_tr_err, Database};
use crate::models::{fmt_ts, parse_opt_ts, parse_ts};

const REPLY_COLUMNS: &str =
    "id, counterpart_id, review_key, text, created_at, send_at, status, sent_at, failure";

fn row_to_reply(row: &Row<'_>) -> Result<ScheduledReply, rusqlite::Error> {
    let created_at: String = row.get(4)?;
    let send_at: String = row.get(5)?;
    let status: String = row.get(6)?;
    let sent_at: Option<String> = row.get(7)?;

    Ok(ScheduledReply {
        id: ReplyId(row.get(0)?),
        counterpart_id: cadence_core::types::CounterpartId(row.get(1)?),
        review_key: row.get(2)?,
        text: row.get(3)?,
        created_at: parse_ts(4, &created_at)?,
        send_at: parse_ts(5, &send_at)?,
        status: ReplyStatus::from_str(&status).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?,
        sent_at: parse_opt_ts(7, sent_at.as_deref())?,
        failure: row.get(8)?,
    })
}

/// Inserts a scheduled reply unless one already exists for the same
/// `review_key`; returns whichever record now owns the key.
///
/// The conflict path is how `send_at` stays write-once: a duplicate schedule
/// attempt (UI refresh, re-delivered approval event) gets the original
/// record back with its original send time.
pub async fn insert_if_absent(
    db: &Database,
    reply: &ScheduledReply,
) -> Result<ScheduledReply, CadenceError> {
    let reply = reply.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO scheduled_replies
                     (id, counterpart_id, review_key, text, created_at, send_at, status, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(review_key) DO NOTHING",
                params![
                    reply.id.0,
                    reply.counterpart_id.0,
                    reply.review_key,
                    reply.text,
                    fmt_ts(reply.created_at),
                    fmt_ts(reply.send_at),
                    reply.status.to_string(),
                    fmt_ts(reply.created_at),
                ],
            )?;

            let winner = conn.query_row(
                &format!(
                    "SELECT {REPLY_COLUMNS} FROM scheduled_replies WHERE review_key = ?1"
                ),
                params![reply.review_key],
                row_to_reply,
            )?;
            Ok(winner)
        })
        .await
        .map_err(map_tr_err)
}

/// Atomically claims all due pending replies, ordered by `send_at` ascending.
///
/// Runs in one transaction on the single writer: selects pending records
/// whose `send_at` is due and whose lease is free or expired, then stamps a
/// fresh `locked_until` on each. Two concurrent sweeps cannot claim the same
/// record within one lease period.
pub async fn claim_due(
    db: &Database,
    now: DateTime<Utc>,
    lease: Duration,
) -> Result<Vec<ScheduledReply>, CadenceError> {
    let now_s = fmt_ts(now);
    let lease_until = fmt_ts(now + chrono::Duration::seconds(lease.as_secs() as i64));
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let due = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {REPLY_COLUMNS} FROM scheduled_replies
                     WHERE status = 'pending'
                       AND send_at <= ?1
                       AND (locked_until IS NULL OR locked_until < ?1)
                     ORDER BY send_at ASC"
                ))?;
                let rows = stmt.query_map(params![now_s], row_to_reply)?;
                let mut due = Vec::new();
                for row in rows {
                    due.push(row?);
                }
                due
            };

            for reply in &due {
                tx.execute(
                    "UPDATE scheduled_replies
                     SET locked_until = ?1, updated_at = ?2
                     WHERE id = ?3",
                    params![lease_until, now_s, reply.id.0],
                )?;
            }

            tx.commit()?;
            Ok(due)
        })
        .await
        .map_err(map_tr_err)
}

/// Atomically claims one specific pending reply regardless of its `send_at`
/// (operator force-send). Returns `None` when the record is missing, already
/// terminal, or holds an unexpired lease.
pub async fn claim_one(
    db: &Database,
    id: &ReplyId,
    now: DateTime<Utc>,
    lease: Duration,
) -> Result<Option<ScheduledReply>, CadenceError> {
    let id = id.0.clone();
    let now_s = fmt_ts(now);
    let lease_until = fmt_ts(now + chrono::Duration::seconds(lease.as_secs() as i64));
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let result = tx.query_row(
                &format!(
                    "SELECT {REPLY_COLUMNS} FROM scheduled_replies
                     WHERE id = ?1
                       AND status = 'pending'
                       AND (locked_until IS NULL OR locked_until < ?2)"
                ),
                params![id, now_s],
                row_to_reply,
            );

            match result {
                Ok(reply) => {
                    tx.execute(
                        "UPDATE scheduled_replies
                         SET locked_until = ?1, updated_at = ?2
                         WHERE id = ?3",
                        params![lease_until, now_s, reply.id.0],
                    )?;
                    tx.commit()?;
                    Ok(Some(reply))
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    tx.commit()?;
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Transitions a pending reply to sent. Re-marking a terminal record is a
/// no-op, not an error.
pub async fn mark_sent(
    db: &Database,
    id: &ReplyId,
    at: DateTime<Utc>,
) -> Result<(), CadenceError> {
    let id = id.0.clone();
    let at_s = fmt_ts(at);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE scheduled_replies
                 SET status = 'sent', sent_at = ?2, locked_until = NULL, updated_at = ?2
                 WHERE id = ?1 AND status = 'pending'",
                params![id, at_s],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Transitions a pending reply to failed with a reason. Re-marking a
/// terminal record is a no-op, not an error.
pub async fn mark_failed(
    db: &Database,
    id: &ReplyId,
    reason: &str,
    at: DateTime<Utc>,
) -> Result<(), CadenceError> {
    let id = id.0.clone();
    let reason = reason.to_string();
    let at_s = fmt_ts(at);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE scheduled_replies
                 SET status = 'failed', failure = ?2, locked_until = NULL, updated_at = ?3
                 WHERE id = ?1 AND status = 'pending'",
                params![id, reason, at_s],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetches a reply by id.
pub async fn get(db: &Database, id: &ReplyId) -> Result<Option<ScheduledReply>, CadenceError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {REPLY_COLUMNS} FROM scheduled_replies WHERE id = ?1"),
                params![id],
                row_to_reply,
            );
            match result {
                Ok(reply) => Ok(Some(reply)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Aggregates pending count, today's terminal counts, and the next due send.
pub async fn stats(db: &Database, now: DateTime<Utc>) -> Result<OrchestratorStats, CadenceError> {
    let day_start = fmt_ts(Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN)));
    db.connection()
        .call(move |conn| {
            let pending: i64 = conn.query_row(
                "SELECT COUNT(*) FROM scheduled_replies WHERE status = 'pending'",
                [],
                |row| row.get(0),
            )?;
            let sent_today: i64 = conn.query_row(
                "SELECT COUNT(*) FROM scheduled_replies
                 WHERE status = 'sent' AND sent_at >= ?1",
                params![day_start],
                |row| row.get(0),
            )?;
            let failed_today: i64 = conn.query_row(
                "SELECT COUNT(*) FROM scheduled_replies
                 WHERE status = 'failed' AND updated_at >= ?1",
                params![day_start],
                |row| row.get(0),
            )?;
            let next_send_at: Option<String> = conn.query_row(
                "SELECT MIN(send_at) FROM scheduled_replies WHERE status = 'pending'",
                [],
                |row| row.get(0),
            )?;

            let next_send_at = match next_send_at {
                Some(raw) => Some(parse_ts(0, &raw)?),
                None => None,
            };

            Ok(OrchestratorStats {
                pending: pending as u64,
                sent_today: sent_today as u64,
                failed_today: failed_today as u64,
                next_send_at,
            })
        })
        .await
        .map_err(map_tr_err)
}
