// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streak and quest rules for Streakbot.
//!
//! Everything here is pure: the engines take copies of stored state and
//! return decisions, the classifier looks only at message text, and the
//! report builders only format. Persistence and delivery live elsewhere.

pub mod classify;
pub mod clock;
pub mod markdown;
pub mod quest;
pub mod reports;
pub mod streak;

pub use classify::{Command, has_streak_marker, parse_command};
pub use clock::LocalZone;
pub use quest::{QuestOutcome, QuestRules, select_quests};
pub use streak::{StreakEvent, StreakPolicy, evaluate_streak, streak_mutation};
