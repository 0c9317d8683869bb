// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The bot's single local time zone.
//!
//! Every "today", cutoff check, and cron evaluation uses the same fixed UTC
//! offset so that dates stored by different components always agree.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Timelike, Utc};
use streakbot_core::StreakbotError;

/// A fixed UTC offset used for all local-time decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalZone {
    offset: FixedOffset,
}

impl LocalZone {
    /// A zone `hours` east of UTC.
    pub fn from_hours(hours: i32) -> Result<Self, StreakbotError> {
        FixedOffset::east_opt(hours * 3600)
            .map(|offset| Self { offset })
            .ok_or_else(|| StreakbotError::Config(format!("invalid UTC offset: {hours} hours")))
    }

    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn local(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.offset)
    }

    /// The local calendar date of an instant.
    pub fn date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        self.local(at).date_naive()
    }

    /// The local hour (0..=23) of an instant.
    pub fn hour_of(&self, at: DateTime<Utc>) -> u32 {
        self.local(at).hour()
    }

    /// The local calendar year of an instant.
    pub fn year_of(&self, at: DateTime<Utc>) -> i32 {
        self.local(at).year()
    }
}

impl Default for LocalZone {
    fn default() -> Self {
        Self::utc()
    }
}
