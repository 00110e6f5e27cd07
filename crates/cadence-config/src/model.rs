// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Cadence response orchestrator.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Cadence configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CadenceConfig {
    /// Orchestrator identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Inbound fragment debouncing settings.
    #[serde(default)]
    pub debounce: DebounceConfig,

    /// Outbound reply pacing settings.
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Generation retry chain settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Delivery sweeper settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Orchestrator identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the orchestrator instance.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "cadence".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Inbound fragment debouncing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebounceConfig {
    /// Quiet window in seconds for steady-state conversation. The window
    /// restarts on every new fragment.
    #[serde(default = "default_quiet_window_secs")]
    pub quiet_window_secs: u64,

    /// Quiet window in seconds for a counterpart's first message of the day,
    /// so the orchestrator never appears to answer a cold open instantly.
    #[serde(default = "default_cold_open_window_secs")]
    pub cold_open_window_secs: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            quiet_window_secs: default_quiet_window_secs(),
            cold_open_window_secs: default_cold_open_window_secs(),
        }
    }
}

fn default_quiet_window_secs() -> u64 {
    18
}

fn default_cold_open_window_secs() -> u64 {
    300 // 5 minutes
}

/// Outbound reply pacing configuration.
///
/// The target delay mirrors the counterpart's own response latency, clamped
/// into `[min_delay_secs, max_delay_secs]` and perturbed by jitter. These
/// knobs govern reply pacing only -- batching is the debounce section's job.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PacingConfig {
    /// Lower bound on the outbound delay in seconds.
    #[serde(default = "default_min_delay_secs")]
    pub min_delay_secs: u64,

    /// Upper bound on the outbound delay in seconds.
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,

    /// Fractional jitter applied to the base delay (0.10 = plus or minus 10%).
    #[serde(default = "default_jitter_pct")]
    pub jitter_pct: f64,

    /// Delay in seconds used when no prior outbound reply exists.
    #[serde(default = "default_first_reply_delay_secs")]
    pub first_reply_delay_secs: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: default_min_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            jitter_pct: default_jitter_pct(),
            first_reply_delay_secs: default_first_reply_delay_secs(),
        }
    }
}

fn default_min_delay_secs() -> u64 {
    180 // 3 minutes
}

fn default_max_delay_secs() -> u64 {
    43_200 // 12 hours
}

fn default_jitter_pct() -> f64 {
    0.10
}

fn default_first_reply_delay_secs() -> u64 {
    240 // 4 minutes
}

/// Generation retry chain configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Attempt ceiling across the whole backend chain.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base step in seconds for the linearly increasing backoff applied when
    /// a non-primary backend rate-limits.
    #[serde(default = "default_backoff_step_secs")]
    pub backoff_step_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_step_secs: default_backoff_step_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_step_secs() -> u64 {
    2
}

/// Delivery sweeper configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Interval in seconds between sweep cycles.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Lease in seconds on a claimed record. A claim left behind by a crashed
    /// process expires after this long and the record becomes claimable again.
    #[serde(default = "default_claim_lease_secs")]
    pub claim_lease_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
            claim_lease_secs: default_claim_lease_secs(),
        }
    }
}

fn default_sweep_interval_secs() -> u64 {
    30
}

fn default_claim_lease_secs() -> u64 {
    300
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("cadence").join("cadence.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("cadence.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = CadenceConfig::default();
        assert_eq!(config.agent.name, "cadence");
        assert_eq!(config.debounce.quiet_window_secs, 18);
        assert!(config.debounce.cold_open_window_secs > config.debounce.quiet_window_secs);
        assert!(config.pacing.min_delay_secs <= config.pacing.max_delay_secs);
        assert_eq!(config.generation.max_attempts, 3);
        assert_eq!(config.dispatch.sweep_interval_secs, 30);
        assert!(config.storage.wal_mode);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let toml_str = r#"
[pacing]
min_delay_secs = 60
max_dleay_secs = 600
"#;
        assert!(toml::from_str::<CadenceConfig>(toml_str).is_err());
    }

    #[test]
    fn partial_section_fills_remaining_defaults() {
        let toml_str = r#"
[debounce]
quiet_window_secs = 10
"#;
        let config: CadenceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.debounce.quiet_window_secs, 10);
        assert_eq!(config.debounce.cold_open_window_secs, 300);
    }
}
