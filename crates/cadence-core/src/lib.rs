// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core trait definitions, error types, and common types for the Cadence
//! response orchestrator.
//!
//! Everything the orchestrator shares with its collaborators lives here:
//! the [`CadenceError`] taxonomy, the data model (fragments, combined
//! messages, scheduled replies), and the trait seams behind which the
//! embedding application supplies transport, generation back-ends, and
//! review-queue integrations.

pub mod error;
pub mod traits;
pub mod types;

pub use error::CadenceError;
pub use traits::backend::{BackendFailure, GenerationBackend};
pub use traits::conversation::{
    HistoryProvider, PromptBuilder, ReplyPolicy, ReviewQueue, StageResolver,
};
pub use traits::store::ReplyStore;
pub use traits::transport::MessageSender;
