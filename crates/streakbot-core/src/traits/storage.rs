// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait: the persistence gateway for streaks and quests.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StreakbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    ChatId, DailyQuest, DailyQuestAssignment, GroupChat, QuestCompletion, QuestScore,
    QuestTemplate, RolloverSummary, StreakArchiveEntry, StreakEvaluation, StreakMutation,
    StreakRecord, UserId,
};

/// Typed access to every entity the bot persists.
///
/// Implementations own all rows; callers receive copies. The only operation
/// needing per-key serialization is [`update_streak`](Self::update_streak),
/// which must run its mutation as an atomic read-modify-write.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), StreakbotError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), StreakbotError>;

    // --- Group registry ---

    /// Records a group chat, refreshing its title if already known.
    async fn register_chat(&self, chat_id: ChatId, title: Option<&str>)
    -> Result<(), StreakbotError>;

    /// Lists every registered group chat.
    async fn list_chats(&self) -> Result<Vec<GroupChat>, StreakbotError>;

    // --- Streaks ---

    /// Creates a zero-state record if none exists and refreshes the display name.
    async fn ensure_streak_record(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        display_name: &str,
    ) -> Result<StreakRecord, StreakbotError>;

    /// Atomically applies `mutation` to the record for (chat, user).
    ///
    /// The mutation sees the committed row (or `None`) and no other update to
    /// the same key can interleave between that read and the write. The
    /// returned record is persisted when accepted; the display name is
    /// refreshed either way.
    async fn update_streak(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        display_name: &str,
        mutation: StreakMutation,
    ) -> Result<StreakEvaluation, StreakbotError>;

    /// All records of a chat, highest streak first.
    async fn list_streaks(&self, chat_id: ChatId) -> Result<Vec<StreakRecord>, StreakbotError>;

    // --- Quests ---

    /// Inserts templates whose tag is not yet in the catalog.
    async fn seed_quest_templates(&self, templates: &[QuestTemplate])
    -> Result<usize, StreakbotError>;

    /// The full quest catalog.
    async fn list_quest_templates(&self) -> Result<Vec<QuestTemplate>, StreakbotError>;

    /// The quests assigned to a chat for a day, in listed order.
    async fn daily_quests(
        &self,
        chat_id: ChatId,
        date: NaiveDate,
    ) -> Result<Vec<DailyQuest>, StreakbotError>;

    /// Tags assigned to a chat on any day in `from..=to`.
    async fn recent_quest_tags(
        &self,
        chat_id: ChatId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<String>, StreakbotError>;

    /// Stores `templates` as the assignment for (chat, date) unless one exists.
    ///
    /// Returns the assignment actually stored; `created` is false when an
    /// earlier assignment was kept.
    async fn assign_daily_quests(
        &self,
        chat_id: ChatId,
        date: NaiveDate,
        templates: &[QuestTemplate],
    ) -> Result<DailyQuestAssignment, StreakbotError>;

    /// Tags the user already completed in the chat on `date`.
    async fn completed_tags(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<String>, StreakbotError>;

    /// Insert-or-ignore. Returns `true` if a new row was written.
    async fn insert_completion(&self, completion: &QuestCompletion)
    -> Result<bool, StreakbotError>;

    /// Current-cycle leaderboard, most completions first.
    async fn quest_scores(&self, chat_id: ChatId) -> Result<Vec<QuestScore>, StreakbotError>;

    // --- Archive ---

    /// Archived streaks of a chat for one year, highest first.
    async fn archived_streaks(
        &self,
        chat_id: ChatId,
        year: i32,
    ) -> Result<Vec<StreakArchiveEntry>, StreakbotError>;

    /// Archived quest tallies of a chat for one year, most first.
    async fn archived_quest_scores(
        &self,
        chat_id: ChatId,
        year: i32,
    ) -> Result<Vec<QuestScore>, StreakbotError>;

    /// Archives streaks and quest tallies under `year`, then resets the cycle.
    ///
    /// Archive rows are insert-or-ignore per (chat, user, year), so re-running
    /// never duplicates or overwrites them.
    async fn archive_and_reset(&self, year: i32) -> Result<RolloverSummary, StreakbotError>;
}
