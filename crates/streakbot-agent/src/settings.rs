// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime settings derived once from the loaded configuration.

use std::time::Duration;

use streakbot_config::StreakbotConfig;
use streakbot_core::StreakbotError;
use streakbot_engine::{LocalZone, QuestRules, StreakPolicy};

use crate::retry::RetryPolicy;

/// Everything the dispatcher and the jobs need from the configuration.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub zone: LocalZone,
    pub streaks: StreakPolicy,
    pub quests: QuestRules,
    pub retry: RetryPolicy,
    pub workers: usize,
    pub reaction_emoji: String,
    pub quests_per_day: usize,
    pub exclude_recent_days: u32,
    pub quotes: Vec<String>,
}

impl AgentSettings {
    pub fn from_config(config: &StreakbotConfig) -> Result<Self, StreakbotError> {
        Ok(Self {
            zone: LocalZone::from_hours(config.schedule.utc_offset_hours)?,
            streaks: StreakPolicy {
                daily_cap: config.streaks.daily_cap,
            },
            quests: QuestRules {
                cutoff_hour: config.quests.cutoff_hour,
                match_bare_words: config.quests.match_bare_words,
            },
            retry: RetryPolicy {
                max_attempts: config.bot.max_attempts,
                backoff: Duration::from_millis(config.bot.retry_backoff_ms),
            },
            workers: config.bot.workers.max(1),
            reaction_emoji: config.telegram.reaction_emoji.clone(),
            quests_per_day: config.quests.per_day,
            exclude_recent_days: config.quests.exclude_recent_days,
            quotes: config.reminders.quotes.clone(),
        })
    }

    /// The zone's offset in whole hours, for user-facing notices.
    pub fn utc_offset_hours(&self) -> i32 {
        self.zone.offset().local_minus_utc() / 3600
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            zone: LocalZone::utc(),
            streaks: StreakPolicy::default(),
            quests: QuestRules::default(),
            retry: RetryPolicy::default(),
            workers: 4,
            reaction_emoji: "🔥".into(),
            quests_per_day: 1,
            exclude_recent_days: 1,
            quotes: vec!["Keep going!".into()],
        }
    }
}
