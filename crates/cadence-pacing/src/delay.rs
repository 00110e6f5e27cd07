// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Target outbound delay computation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

use cadence_config::model::PacingConfig;

/// Computes how long to wait before dispatching a reply.
///
/// The base delay mirrors the counterpart's own response latency (their
/// inbound arrival minus our previous outbound), clamped into
/// `[min_delay, max_delay]`. When no prior outbound exists the policy falls
/// back to `first_reply_delay` -- an independent knob from the cold-open
/// debounce window, which governs batching rather than pacing.
///
/// Base computation is pure and idempotent; jitter is applied separately
/// through a caller-supplied [`Rng`] so tests stay deterministic.
#[derive(Debug, Clone)]
pub struct PacingPolicy {
    min_delay: Duration,
    max_delay: Duration,
    jitter_pct: f64,
    first_reply_delay: Duration,
}

impl PacingPolicy {
    pub fn new(config: &PacingConfig) -> Self {
        Self {
            min_delay: Duration::from_secs(config.min_delay_secs),
            max_delay: Duration::from_secs(config.max_delay_secs),
            jitter_pct: config.jitter_pct,
            first_reply_delay: Duration::from_secs(config.first_reply_delay_secs),
        }
    }

    /// The deterministic part of the delay decision.
    ///
    /// Repeated calls with the same timestamps return the same duration.
    /// Negative elapsed time (clock skew) clamps to zero before the bound
    /// clamp, so skew degenerates to `min_delay` rather than propagating.
    pub fn base_delay(
        &self,
        last_outbound_at: Option<DateTime<Utc>>,
        inbound_at: DateTime<Utc>,
    ) -> Duration {
        let Some(last_outbound_at) = last_outbound_at else {
            return self.clamp(self.first_reply_delay);
        };

        let elapsed_secs = (inbound_at - last_outbound_at).num_seconds().max(0) as u64;
        self.clamp(Duration::from_secs(elapsed_secs))
    }

    /// Perturbs a base delay by up to ±`jitter_pct`, re-clamping the result
    /// into the configured bounds.
    pub fn jittered(&self, base: Duration, rng: &mut impl Rng) -> Duration {
        if self.jitter_pct <= 0.0 {
            return self.clamp(base);
        }
        let factor = rng.gen_range(1.0 - self.jitter_pct..=1.0 + self.jitter_pct);
        let secs = (base.as_secs() as f64 * factor).round().max(0.0) as u64;
        self.clamp(Duration::from_secs(secs))
    }

    /// Full delay decision: base computation followed by jitter.
    pub fn compute_delay(
        &self,
        last_outbound_at: Option<DateTime<Utc>>,
        inbound_at: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> Duration {
        let base = self.base_delay(last_outbound_at, inbound_at);
        self.jittered(base, rng)
    }

    /// Configured upper bound on any computed delay.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Configured lower bound on any computed delay.
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    fn clamp(&self, d: Duration) -> Duration {
        d.clamp(self.min_delay, self.max_delay)
    }
}
