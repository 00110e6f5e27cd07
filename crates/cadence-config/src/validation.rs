// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as ordered delay bounds and jitter ranges.

use crate::diagnostic::ConfigError;
use crate::model::CadenceConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CadenceConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.debounce.quiet_window_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "debounce.quiet_window_secs must be positive".to_string(),
        });
    }

    if config.debounce.cold_open_window_secs < config.debounce.quiet_window_secs {
        errors.push(ConfigError::Validation {
            message: format!(
                "debounce.cold_open_window_secs ({}) must be at least debounce.quiet_window_secs ({})",
                config.debounce.cold_open_window_secs, config.debounce.quiet_window_secs
            ),
        });
    }

    if config.pacing.min_delay_secs > config.pacing.max_delay_secs {
        errors.push(ConfigError::Validation {
            message: format!(
                "pacing.min_delay_secs ({}) must not exceed pacing.max_delay_secs ({})",
                config.pacing.min_delay_secs, config.pacing.max_delay_secs
            ),
        });
    }

    if !(0.0..1.0).contains(&config.pacing.jitter_pct) {
        errors.push(ConfigError::Validation {
            message: format!(
                "pacing.jitter_pct must be in [0.0, 1.0), got {}",
                config.pacing.jitter_pct
            ),
        });
    }

    if config.generation.max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "generation.max_attempts must be at least 1".to_string(),
        });
    }

    if config.dispatch.sweep_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "dispatch.sweep_interval_secs must be positive".to_string(),
        });
    }

    if config.dispatch.claim_lease_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "dispatch.claim_lease_secs must be positive".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
