// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types and timestamp helpers for storage rows.
//!
//! The canonical types are defined in `cadence-core::types` for use across
//! trait boundaries; this module re-exports them and provides the RFC 3339
//! text-column conversions shared by the query modules.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;

pub use cadence_core::types::{Counterpart, ReplyStatus, ScheduledReply};

/// Formats a timestamp as a fixed-width UTC RFC 3339 string.
///
/// All timestamp columns use this format, so lexicographic comparison in SQL
/// matches chronological order.
pub fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a timestamp column written by [`fmt_ts`].
pub fn parse_ts(column: usize, raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

/// Parses an optional timestamp column.
pub fn parse_opt_ts(
    column: usize,
    raw: Option<&str>,
) -> Result<Option<DateTime<Utc>>, rusqlite::Error> {
    raw.map(|s| parse_ts(column, s)).transpose()
}
