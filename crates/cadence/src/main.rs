// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cadence - a conversation response orchestrator that paces automated
//! replies like a human operator.
//!
//! This binary is the operator surface over the orchestrator library: the
//! transport, generation back-ends, and review UI are wired in by the
//! embedding application. Here we expose the scheduled-reply store
//! (`status`) and the effective configuration (`config`).

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod status;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Cadence - conversation response orchestrator.
#[derive(Parser, Debug)]
#[command(name = "cadence", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Show scheduled-reply statistics from the configured database.
    Status,
    /// Load, validate, and summarize the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match cadence_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            cadence_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    match cli.command {
        Some(Commands::Status) => {
            if let Err(e) = status::run_status(&config).await {
                error!(error = %e, "status command failed");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            print_config_summary(&config);
        }
        None => {
            println!("cadence: use --help for available commands");
        }
    }
}

/// Initializes the tracing subscriber from the configured log level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Prints the effective configuration, section by section.
fn print_config_summary(config: &cadence_config::CadenceConfig) {
    println!("agent.name              = {}", config.agent.name);
    println!("agent.log_level         = {}", config.agent.log_level);
    println!(
        "debounce.quiet_window   = {}s (cold open {}s)",
        config.debounce.quiet_window_secs, config.debounce.cold_open_window_secs
    );
    println!(
        "pacing.delay            = {}s..{}s (jitter {:.0}%, first reply {}s)",
        config.pacing.min_delay_secs,
        config.pacing.max_delay_secs,
        config.pacing.jitter_pct * 100.0,
        config.pacing.first_reply_delay_secs
    );
    println!(
        "generation              = {} attempts, backoff step {}s",
        config.generation.max_attempts, config.generation.backoff_step_secs
    );
    println!(
        "dispatch                = sweep every {}s, claim lease {}s",
        config.dispatch.sweep_interval_secs, config.dispatch.claim_lease_secs
    );
    println!("storage.database_path   = {}", config.storage.database_path);
}
