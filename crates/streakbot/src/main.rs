// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streakbot - daily streaks and quests for Telegram group chats.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::IntoDiagnostic;
use streakbot_config::StreakbotConfig;

/// Streakbot - daily streaks and quests for Telegram group chats.
#[derive(Parser, Debug)]
#[command(name = "streakbot", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Connect to Telegram and run the bot (the default).
    Serve,
    /// Archive the current cycle and reset all counters, then exit.
    Rollover {
        /// Year to archive under; defaults to the current local year.
        #[arg(long)]
        year: Option<i32>,
    },
    /// Validate the configuration and exit.
    CheckConfig,
}

fn load_config(path: Option<&std::path::Path>) -> StreakbotConfig {
    let loaded = match path {
        Some(path) => streakbot_config::load_and_validate_path(path),
        None => streakbot_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            streakbot_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve::run_serve(config).await.into_diagnostic(),
        Commands::Rollover { year } => {
            let summary = serve::run_rollover(config, year).await.into_diagnostic()?;
            println!(
                "streakbot: archived {} streaks and {} quest tallies under {}; reset {} streaks, cleared {} completions",
                summary.streaks_archived,
                summary.quest_tallies_archived,
                summary.year,
                summary.streaks_reset,
                summary.completions_cleared,
            );
            Ok(())
        }
        Commands::CheckConfig => {
            println!(
                "streakbot: config ok (bot.name={}, utc_offset_hours={}, {} quest templates)",
                config.bot.name,
                config.schedule.utc_offset_hours,
                config.quests.templates().len(),
            );
            Ok(())
        }
    }
}
