// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound transport trait for the chat platform.

use async_trait::async_trait;

use crate::error::CadenceError;
use crate::types::CounterpartId;

/// Sends a reply to a counterpart over the chat platform.
///
/// The concrete transport (and its session management) lives outside this
/// repository; the sweeper only needs a send primitive with a fallible
/// outcome.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, counterpart_id: &CounterpartId, text: &str) -> Result<(), CadenceError>;
}
