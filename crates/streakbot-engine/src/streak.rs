// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily streak counting.

use chrono::NaiveDate;
use streakbot_core::types::{ChatId, StreakEvaluation, StreakMutation, StreakRecord, UserId};

/// How many increments a user may earn per calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakPolicy {
    pub daily_cap: u8,
}

impl Default for StreakPolicy {
    fn default() -> Self {
        Self { daily_cap: 2 }
    }
}

/// One qualifying marker message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakEvent {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub display_name: String,
    /// Local calendar date of the message.
    pub date: NaiveDate,
}

/// Decide whether a marker is accepted and compute the resulting record.
///
/// A new day always grants one increment and restarts the daily count; a
/// repeat on the same day grants another only while the count is below the
/// cap. A rejected evaluation returns the record unchanged apart from the
/// display name.
pub fn evaluate_streak(
    policy: &StreakPolicy,
    current: Option<StreakRecord>,
    event: &StreakEvent,
) -> StreakEvaluation {
    let Some(mut record) = current else {
        return StreakEvaluation {
            record: StreakRecord {
                chat_id: event.chat_id,
                user_id: event.user_id,
                display_name: event.display_name.clone(),
                streak: 1,
                last_activity: Some(event.date),
                daily_count: 1,
            },
            accepted: true,
        };
    };

    record.display_name.clone_from(&event.display_name);

    let accepted = if record.last_activity != Some(event.date) {
        record.last_activity = Some(event.date);
        record.daily_count = 1;
        true
    } else if record.daily_count < policy.daily_cap {
        record.daily_count += 1;
        true
    } else {
        false
    };

    if accepted {
        record.streak = record.streak.saturating_add(1);
    }
    StreakEvaluation { record, accepted }
}

/// Package [`evaluate_streak`] as a store mutation.
///
/// Build a fresh mutation for every attempt; it is consumed by the store.
pub fn streak_mutation(policy: StreakPolicy, event: StreakEvent) -> StreakMutation {
    Box::new(move |current| evaluate_streak(&policy, current, &event))
}
