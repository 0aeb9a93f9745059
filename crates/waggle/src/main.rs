// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Waggle - community AI check-in bot for Slack.
//!
//! Binary entry point: loads and validates configuration, then
//! dispatches to the serve loop or one of the operational subcommands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;
mod trigger;

/// Waggle - community AI check-in bot for Slack.
#[derive(Parser, Debug)]
#[command(name = "waggle", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot: webhook server, event loop, and schedulers.
    Serve,
    /// Send this week's check-in to all eligible users now.
    TriggerCheckin,
    /// Send the reminder nudge to users who have not answered yet.
    TriggerReminder,
    /// Print aggregated participation statistics as JSON.
    Stats,
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("waggle={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match waggle_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            waggle_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Some(Commands::Serve) | None => serve::run_serve(config).await,
        Some(Commands::TriggerCheckin) => trigger::run_trigger_checkin(config).await,
        Some(Commands::TriggerReminder) => trigger::run_trigger_reminder(config).await,
        Some(Commands::Stats) => trigger::run_stats(config).await,
    };

    if let Err(error) = result {
        tracing::error!(%error, "waggle exited with an error");
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
