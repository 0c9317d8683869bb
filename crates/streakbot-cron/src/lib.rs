// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cron scheduling for the bot's periodic jobs.
//!
//! Expressions are standard five-field cron evaluated in a fixed UTC offset
//! (the bot's local zone). Each registered job runs on its own task, sleeping
//! until its next occurrence, until the shared cancellation token fires.

pub mod schedule;
pub mod scheduler;

pub use schedule::CronSchedule;
pub use scheduler::{CronJob, CronScheduler};
