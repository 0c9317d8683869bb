// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the ranges and cross-field constraints serde cannot express:
//! quest counts, cutoff hours, UTC offsets, cron expressions, and catalog tags.

use std::collections::HashSet;
use std::net::SocketAddr;

use croner::Cron;
use streakbot_core::types::is_valid_quest_tag;

use crate::diagnostic::ConfigError;
use crate::model::StreakbotConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every problem rather than failing on the first one.
pub fn validate_config(config: &StreakbotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.bot.workers == 0 {
        errors.push(ConfigError::validation("bot.workers must be at least 1"));
    }
    if config.bot.max_attempts == 0 {
        errors.push(ConfigError::validation("bot.max_attempts must be at least 1"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.metrics.enabled && config.metrics.listen_addr.parse::<SocketAddr>().is_err() {
        errors.push(ConfigError::validation(format!(
            "metrics.listen_addr `{}` is not a socket address",
            config.metrics.listen_addr
        )));
    }

    if config.telegram.reaction_emoji.trim().is_empty() {
        errors.push(ConfigError::validation(
            "telegram.reaction_emoji must not be empty",
        ));
    }

    if config.streaks.daily_cap == 0 {
        errors.push(ConfigError::validation("streaks.daily_cap must be at least 1"));
    }

    let quests = &config.quests;
    if !(1..=2).contains(&quests.per_day) {
        errors.push(ConfigError::validation(format!(
            "quests.per_day must be 1 or 2, got {}",
            quests.per_day
        )));
    }
    if quests.exclude_recent_days > 7 {
        errors.push(ConfigError::validation(format!(
            "quests.exclude_recent_days must be between 0 and 7, got {}",
            quests.exclude_recent_days
        )));
    }
    if !(1..=24).contains(&quests.cutoff_hour) {
        errors.push(ConfigError::validation(format!(
            "quests.cutoff_hour must be between 1 and 24, got {}",
            quests.cutoff_hour
        )));
    }

    let mut seen_tags = HashSet::new();
    for (i, entry) in quests.catalog.iter().enumerate() {
        let tag = entry.tag.trim().to_lowercase();
        if tag.is_empty() {
            errors.push(ConfigError::validation(format!(
                "quests.catalog[{i}].tag must not be empty"
            )));
            continue;
        }
        if !is_valid_quest_tag(&entry.tag) {
            errors.push(ConfigError::validation(format!(
                "quests.catalog[{i}].tag `{}` may only contain letters, digits, and `_`",
                entry.tag
            )));
        }
        if entry.description.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "quests.catalog[{i}].description must not be empty"
            )));
        }
        if !seen_tags.insert(tag) {
            errors.push(ConfigError::validation(format!(
                "duplicate quest tag `{}` in quests.catalog",
                entry.tag
            )));
        }
    }

    let schedule = &config.schedule;
    if !(-12..=14).contains(&schedule.utc_offset_hours) {
        errors.push(ConfigError::validation(format!(
            "schedule.utc_offset_hours must be between -12 and 14, got {}",
            schedule.utc_offset_hours
        )));
    }
    for (key, expression) in [
        ("quest_broadcast", &schedule.quest_broadcast),
        ("reminder", &schedule.reminder),
        ("rollover", &schedule.rollover),
    ] {
        if let Err(e) = expression.parse::<Cron>() {
            errors.push(ConfigError::InvalidSchedule {
                key: key.to_string(),
                expression: expression.clone(),
                reason: e.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
