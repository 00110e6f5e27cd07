// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply-text generation through a ranked chain of back-ends.
//!
//! [`RetryingGenerator`] tries back-ends in priority order with a chain-wide
//! attempt ceiling. Rate limiting on the primary back-end falls straight
//! through to the secondary (primary exhaustion is assumed to persist for
//! the retry horizon); rate limiting elsewhere retries the same back-end
//! with linearly increasing backoff; any other failure escalates to the
//! next back-end immediately.

pub mod chain;

pub use chain::RetryingGenerator;
