// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Streakbot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};
use streakbot_core::types::QuestTemplate;

/// Top-level Streakbot configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StreakbotConfig {
    /// Process-level behavior: logging, worker pool, retries.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Streak counting policy.
    #[serde(default)]
    pub streaks: StreakConfig,

    /// Daily quest policy and catalog.
    #[serde(default)]
    pub quests: QuestConfig,

    /// Periodic job schedule.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Inactivity reminder content.
    #[serde(default)]
    pub reminders: ReminderConfig,

    /// Prometheus exporter for the bot's counters.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name used in logs and the startup banner.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Number of concurrent message handlers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Attempts per store call before a message is dropped.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between store retries, multiplied by the attempt number.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
            workers: default_workers(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_bot_name() -> String {
    "streakbot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_workers() -> usize {
    4
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    200
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required by `streakbot serve`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Emoji set as a reaction on accepted streaks and completed quests.
    #[serde(default = "default_reaction_emoji")]
    pub reaction_emoji: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            reaction_emoji: default_reaction_emoji(),
        }
    }
}

fn default_reaction_emoji() -> String {
    "🔥".to_string()
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
    "streakbot.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Serve `/metrics` while the bot runs.
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,

    /// Socket address the exporter listens on.
    #[serde(default = "default_metrics_listen_addr")]
    pub listen_addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            listen_addr: default_metrics_listen_addr(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_listen_addr() -> String {
    "127.0.0.1:9464".to_string()
}

/// Streak counting policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StreakConfig {
    /// Maximum accepted increments per user per calendar day.
    #[serde(default = "default_daily_cap")]
    pub daily_cap: u8,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            daily_cap: default_daily_cap(),
        }
    }
}

fn default_daily_cap() -> u8 {
    2
}

/// Daily quest policy and the template catalog.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuestConfig {
    /// Quests assigned per chat per day (1 or 2).
    #[serde(default = "default_per_day")]
    pub per_day: usize,

    /// Days before today whose tags are avoided when assigning.
    #[serde(default = "default_exclude_recent_days")]
    pub exclude_recent_days: u32,

    /// Local hour at which completions stop being accepted.
    #[serde(default = "default_cutoff_hour")]
    pub cutoff_hour: u32,

    /// Also accept a tag written as a bare word, without `#`.
    #[serde(default)]
    pub match_bare_words: bool,

    /// Templates seeded into the store at startup.
    #[serde(default = "default_catalog")]
    pub catalog: Vec<QuestTemplateConfig>,
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            per_day: default_per_day(),
            exclude_recent_days: default_exclude_recent_days(),
            cutoff_hour: default_cutoff_hour(),
            match_bare_words: false,
            catalog: default_catalog(),
        }
    }
}

impl QuestConfig {
    /// The configured catalog as domain templates.
    pub fn templates(&self) -> Vec<QuestTemplate> {
        self.catalog
            .iter()
            .map(|q| QuestTemplate::new(q.description.clone(), q.tag.clone()))
            .collect()
    }
}

/// One `[[quests.catalog]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuestTemplateConfig {
    pub description: String,
    pub tag: String,
}

fn default_per_day() -> usize {
    1
}

fn default_exclude_recent_days() -> u32 {
    1
}

fn default_cutoff_hour() -> u32 {
    22
}

fn default_catalog() -> Vec<QuestTemplateConfig> {
    [
        ("Go for a 20 minute run", "run"),
        ("Do 50 push-ups over the day", "pushups"),
        ("Take a 30 minute walk outside", "walk"),
        ("Stretch for 15 minutes", "stretch"),
        ("Drink 2 litres of water", "water"),
        ("Hold a plank for 2 minutes total", "plank"),
    ]
    .into_iter()
    .map(|(description, tag)| QuestTemplateConfig {
        description: description.to_string(),
        tag: tag.to_string(),
    })
    .collect()
}

/// Periodic job schedule.
///
/// Cron expressions use five fields and are evaluated in the fixed offset
/// given by `utc_offset_hours`, the same offset used for every "today".
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Run the periodic jobs at all.
    #[serde(default = "default_schedule_enabled")]
    pub enabled: bool,

    /// Offset of the bot's local time zone from UTC, in hours.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,

    /// When today's quests are assigned and announced.
    #[serde(default = "default_quest_broadcast")]
    pub quest_broadcast: String,

    /// When inactive users are reminded.
    #[serde(default = "default_reminder")]
    pub reminder: String,

    /// When the yearly archive-and-reset runs.
    #[serde(default = "default_rollover")]
    pub rollover: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: default_schedule_enabled(),
            utc_offset_hours: default_utc_offset_hours(),
            quest_broadcast: default_quest_broadcast(),
            reminder: default_reminder(),
            rollover: default_rollover(),
        }
    }
}

fn default_schedule_enabled() -> bool {
    true
}

fn default_utc_offset_hours() -> i32 {
    2
}

fn default_quest_broadcast() -> String {
    "0 10 * * *".to_string()
}

fn default_reminder() -> String {
    "0 21 * * *".to_string()
}

fn default_rollover() -> String {
    "55 23 31 12 *".to_string()
}

/// Inactivity reminder content.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReminderConfig {
    /// Motivational lines; one is picked at random per reminder.
    #[serde(default = "default_quotes")]
    pub quotes: Vec<String>,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            quotes: default_quotes(),
        }
    }
}

fn default_quotes() -> Vec<String> {
    [
        "🏋️ Don't wish for it. Work for it.",
        "🔥 Sweat now, shine later.",
        "💪 The only bad workout is the one you didn't do.",
        "🚀 One more rep. One more step. Let's go!",
        "📈 Progress starts with showing up!",
        "⚡ Discipline = freedom. Hit your streak!",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
