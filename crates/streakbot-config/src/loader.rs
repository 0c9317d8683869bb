// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./streakbot.toml` > `~/.config/streakbot/streakbot.toml`
//! > `/etc/streakbot/streakbot.toml` with environment variable overrides via
//! the `STREAKBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::StreakbotConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/streakbot/streakbot.toml` (system-wide)
/// 3. `~/.config/streakbot/streakbot.toml` (user XDG config)
/// 4. `./streakbot.toml` (local directory)
/// 5. `STREAKBOT_*` environment variables
pub fn load_config() -> Result<StreakbotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<StreakbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StreakbotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<StreakbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StreakbotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(StreakbotConfig::default()))
        .merge(Toml::file("/etc/streakbot/streakbot.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("streakbot/streakbot.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("streakbot.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `STREAKBOT_TELEGRAM_BOT_TOKEN` must map to `telegram.bot_token`,
/// not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("STREAKBOT_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name to a dotted config path.
fn map_env_key(key: &str) -> String {
    const SECTIONS: &[&str] = &[
        "bot", "telegram", "storage", "streaks", "quests", "schedule", "reminders", "metrics",
    ];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
