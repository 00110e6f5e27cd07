// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Cadence response orchestrator.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed operations for scheduled
//! replies and counterpart timing records. The [`SqliteReplyStore`] adapter
//! implements the core [`ReplyStore`] trait.
//!
//! [`ReplyStore`]: cadence_core::traits::store::ReplyStore

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteReplyStore;
pub use database::Database;
