// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response-time classification and human-mimicking delay computation.
//!
//! Two independent concerns share the same pair of timestamps (the
//! orchestrator's previous outbound reply and the counterpart's latest
//! inbound arrival):
//! - [`ResponseBucket::classify`] maps the elapsed time into a named bucket
//!   used purely for reporting and CRM tagging, never for control flow.
//! - [`PacingPolicy`] derives the target outbound delay: mirror the
//!   counterpart's own latency, clamp it into configured bounds, then
//!   perturb it with jitter so the timing never looks mechanical.

pub mod bucket;
pub mod delay;

pub use bucket::ResponseBucket;
pub use delay::PacingPolicy;
