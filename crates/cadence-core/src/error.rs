// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Cadence response orchestrator.

use thiserror::Error;

/// The primary error type used across all Cadence components.
///
/// Failures are scoped per counterpart: an error raised while processing one
/// conversation never affects another. Scheduling conflicts are deliberately
/// absent -- a duplicate schedule attempt resolves to the existing record
/// instead of an error path.
#[derive(Debug, Error)]
pub enum CadenceError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Debounce buffer errors. Non-fatal; buffer state is left unaffected.
    #[error("buffer error: {0}")]
    Buffer(String),

    /// The generation chain was exhausted without producing reply text.
    #[error("generation failed after {attempts} attempts: {message}")]
    Generation { message: String, attempts: u32 },

    /// Transport failure while delivering a scheduled reply. The record is
    /// marked failed and surfaced to the operator; the scheduler does not
    /// retry on its own.
    #[error("delivery error: {message}")]
    Delivery {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
