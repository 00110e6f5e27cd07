// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable, exactly-once delivery of approved replies.
//!
//! [`DeliveryScheduler`] persists a computed-once send time per approved
//! reply and dispatches due records through the external sender, claiming
//! each record atomically so concurrent sweeps (a timer tick racing an
//! operator's "send now") never double-send. [`Sweeper`] is the recurring
//! background task that drives it.

pub mod scheduler;
pub mod sweeper;

pub use scheduler::DeliveryScheduler;
pub use sweeper::Sweeper;
