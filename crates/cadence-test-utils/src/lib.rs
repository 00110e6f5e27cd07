// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Cadence integration tests.
//!
//! Mock implementations of every external collaborator seam plus a
//! [`Harness`] that assembles a complete orchestrator stack over a temp
//! SQLite database, enabling fast, CI-runnable end-to-end tests without a
//! chat platform or a real generation backend.

pub mod harness;
pub mod mock_backend;
pub mod mock_sender;
pub mod stubs;

pub use harness::{Harness, HarnessBuilder};
pub use mock_backend::{MockBackend, ScriptedOutcome};
pub use mock_sender::MockSender;
pub use stubs::{
    RecordingReviewQueue, StaticHistory, StaticReplyPolicy, StaticStageResolver,
    TemplatePromptBuilder,
};
