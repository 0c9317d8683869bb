// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsed cron expressions and next-run computation.

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use croner::Cron;
use streakbot_core::StreakbotError;

/// A named cron expression bound to the zone it is evaluated in.
#[derive(Clone)]
pub struct CronSchedule {
    name: String,
    expression: String,
    cron: Cron,
    offset: FixedOffset,
}

impl CronSchedule {
    /// Parse `expression` for the job called `name`.
    pub fn parse(
        name: impl Into<String>,
        expression: &str,
        offset: FixedOffset,
    ) -> Result<Self, StreakbotError> {
        let name = name.into();
        let cron: Cron = expression.parse().map_err(|e| {
            StreakbotError::Config(format!("invalid cron expression for {name} '{expression}': {e}"))
        })?;
        Ok(Self {
            name,
            expression: expression.to_string(),
            cron,
            offset,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The first occurrence strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Result<DateTime<Utc>, StreakbotError> {
        let local = after.with_timezone(&self.offset);
        self.cron
            .find_next_occurrence(&local, false)
            .map(|next| next.with_timezone(&Utc))
            .map_err(|e| {
                StreakbotError::Internal(format!(
                    "no next occurrence for {} '{}': {e}",
                    self.name, self.expression
                ))
            })
    }
}

impl fmt::Debug for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CronSchedule")
            .field("name", &self.name)
            .field("expression", &self.expression)
            .field("offset", &self.offset)
            .finish()
    }
}
