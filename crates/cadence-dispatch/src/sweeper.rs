// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recurring background task that drives the delivery scheduler.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use cadence_config::model::DispatchConfig;

use crate::scheduler::DeliveryScheduler;

/// Runs [`DeliveryScheduler::sweep`] on a fixed interval until cancelled.
///
/// The interval is independent of generation latency; a slow delivery simply
/// delays the next tick (missed ticks are not bursted).
pub struct Sweeper {
    scheduler: Arc<DeliveryScheduler>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(config: &DispatchConfig, scheduler: Arc<DeliveryScheduler>) -> Self {
        Self {
            scheduler,
            interval: Duration::from_secs(config.sweep_interval_secs),
        }
    }

    /// Sweep loop. Returns when the cancellation token fires. A failing
    /// sweep cycle is logged and the loop keeps going.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "sweeper running");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it so a freshly started
        // sweeper does not race startup writes.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping sweeper");
                    break;
                }
                _ = ticker.tick() => {
                    match self.scheduler.sweep(Utc::now()).await {
                        Ok(outcomes) if outcomes.is_empty() => {}
                        Ok(outcomes) => {
                            let delivered = outcomes.iter().filter(|o| o.delivered).count();
                            info!(
                                delivered,
                                failed = outcomes.len() - delivered,
                                "sweep cycle complete"
                            );
                        }
                        Err(e) => {
                            error!(error = %e, "sweep cycle failed");
                        }
                    }
                }
            }
        }
    }
}
