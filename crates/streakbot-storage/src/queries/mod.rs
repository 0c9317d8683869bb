// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. Each function takes `&Database` and runs its SQL
//! through the single connection thread.

pub mod archive;
pub mod chats;
pub mod completions;
pub mod quests;
pub mod streaks;
