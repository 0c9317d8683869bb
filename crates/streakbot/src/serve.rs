// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `streakbot serve` and `streakbot rollover` implementations.
//!
//! Serve opens SQLite storage, seeds the quest catalog, connects to
//! Telegram, starts the cron scheduler for the periodic jobs, and runs the
//! worker pool until SIGINT or SIGTERM.

use std::sync::Arc;

use chrono::Utc;
use streakbot_agent::shutdown;
use streakbot_agent::{AgentSettings, JobKind, Jobs, ScheduledJob, StreakAgent, with_retry};
use streakbot_config::StreakbotConfig;
use streakbot_core::types::RolloverSummary;
use streakbot_core::{ChannelAdapter, StorageAdapter, StreakbotError};
use streakbot_cron::{CronSchedule, CronScheduler};
use streakbot_storage::SqliteStorage;
use streakbot_telegram::TelegramChannel;
use tracing::{info, warn};

/// Runs the `streakbot serve` command.
pub async fn run_serve(config: StreakbotConfig) -> Result<(), StreakbotError> {
    init_tracing(&config.bot.log_level);
    if config.metrics.enabled {
        let listen_addr = config.metrics.listen_addr.parse().map_err(|e| {
            StreakbotError::Config(format!(
                "metrics.listen_addr `{}` is invalid: {e}",
                config.metrics.listen_addr
            ))
        })?;
        streakbot_agent::recording::install_prometheus(listen_addr)?;
    } else {
        streakbot_agent::recording::register_metrics();
    }

    info!(name = %config.bot.name, "starting streakbot serve");

    let settings = AgentSettings::from_config(&config)?;
    let storage = open_storage(&config).await?;
    storage
        .seed_quest_templates(&config.quests.templates())
        .await?;

    let mut telegram = TelegramChannel::new(config.telegram.clone())?;
    telegram.connect().await?;
    let channel: Arc<dyn ChannelAdapter> = Arc::new(telegram);
    let storage: Arc<dyn StorageAdapter> = storage;

    let cancel = shutdown::install_signal_handler();

    let scheduler_handle = if config.schedule.enabled {
        let jobs = Jobs::new(Arc::clone(&channel), Arc::clone(&storage), settings.clone());
        let scheduler = build_scheduler(&config, &settings, jobs)?;
        info!(jobs = scheduler.len(), "cron scheduler started");
        Some(tokio::spawn(scheduler.run(cancel.clone())))
    } else {
        info!("periodic jobs disabled by configuration");
        None
    };

    let agent = StreakAgent::new(Arc::clone(&channel), storage, settings);
    let result = agent.run(cancel.clone()).await;

    // The agent can also stop because the channel closed.
    cancel.cancel();
    if let Some(handle) = scheduler_handle {
        if let Err(e) = handle.await {
            warn!(error = %e, "cron scheduler task failed");
        }
    }
    if let Err(e) = channel.shutdown().await {
        warn!(error = %e, "channel shutdown failed");
    }

    info!("streakbot serve stopped");
    result
}

/// Runs the `streakbot rollover` command.
///
/// Archives under `year`, or under the current local year when none is given.
pub async fn run_rollover(
    config: StreakbotConfig,
    year: Option<i32>,
) -> Result<RolloverSummary, StreakbotError> {
    init_tracing(&config.bot.log_level);

    let settings = AgentSettings::from_config(&config)?;
    let year = year.unwrap_or_else(|| settings.zone.year_of(Utc::now()));
    let storage = open_storage(&config).await?;

    let summary = with_retry(&settings.retry, "archive_and_reset", || {
        storage.archive_and_reset(year)
    })
    .await?;
    storage.close().await?;

    info!(
        year,
        streaks_archived = summary.streaks_archived,
        streaks_reset = summary.streaks_reset,
        "manual rollover complete"
    );
    Ok(summary)
}

async fn open_storage(config: &StreakbotConfig) -> Result<Arc<SqliteStorage>, StreakbotError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(Arc::new(storage))
}

/// Registers the three periodic jobs, all evaluated in the bot's local offset.
fn build_scheduler(
    config: &StreakbotConfig,
    settings: &AgentSettings,
    jobs: Jobs,
) -> Result<CronScheduler, StreakbotError> {
    let offset = settings.zone.offset();
    let mut scheduler = CronScheduler::new();
    for (kind, expression) in [
        (JobKind::QuestBroadcast, &config.schedule.quest_broadcast),
        (JobKind::Reminder, &config.schedule.reminder),
        (JobKind::Rollover, &config.schedule.rollover),
    ] {
        let schedule = CronSchedule::parse(kind.name(), expression, offset)?;
        scheduler.add(schedule, Arc::new(ScheduledJob::new(kind, jobs.clone())));
    }
    Ok(scheduler)
}

/// Initializes the tracing subscriber with the configured log level.
///
/// `RUST_LOG` takes precedence when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("streakbot={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}
