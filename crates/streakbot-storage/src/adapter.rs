// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use streakbot_config::model::StorageConfig;
use streakbot_core::types::{
    ChatId, DailyQuest, DailyQuestAssignment, GroupChat, QuestCompletion, QuestScore,
    QuestTemplate, RolloverSummary, StreakArchiveEntry, StreakEvaluation, StreakMutation,
    StreakRecord, UserId,
};
use streakbot_core::{AdapterType, HealthStatus, PluginAdapter, StorageAdapter, StreakbotError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened on the first call to
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already opened database (used by tests and tooling).
    pub fn from_database(db: Database) -> Self {
        Self {
            config: StorageConfig::default(),
            db: OnceCell::new_with(Some(db)),
        }
    }

    fn db(&self) -> Result<&Database, StreakbotError> {
        self.db
            .get()
            .ok_or_else(|| StreakbotError::storage("storage not initialized -- call initialize() first"))
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, StreakbotError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| conn.query_row("SELECT 1", [], |_| Ok(())))
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), StreakbotError> {
        if self.db.get().is_some() {
            self.close().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), StreakbotError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| StreakbotError::storage("storage already initialized"))?;
        info!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), StreakbotError> {
        let db = self.db()?;
        if self.config.wal_mode {
            db.checkpoint().await?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }

    async fn register_chat(
        &self,
        chat_id: ChatId,
        title: Option<&str>,
    ) -> Result<(), StreakbotError> {
        queries::chats::register_chat(self.db()?, chat_id, title).await
    }

    async fn list_chats(&self) -> Result<Vec<GroupChat>, StreakbotError> {
        queries::chats::list_chats(self.db()?).await
    }

    async fn ensure_streak_record(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        display_name: &str,
    ) -> Result<StreakRecord, StreakbotError> {
        queries::streaks::ensure_record(self.db()?, chat_id, user_id, display_name).await
    }

    async fn update_streak(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        display_name: &str,
        mutation: StreakMutation,
    ) -> Result<StreakEvaluation, StreakbotError> {
        queries::streaks::update_streak(self.db()?, chat_id, user_id, display_name, mutation).await
    }

    async fn list_streaks(&self, chat_id: ChatId) -> Result<Vec<StreakRecord>, StreakbotError> {
        queries::streaks::list_streaks(self.db()?, chat_id).await
    }

    async fn seed_quest_templates(
        &self,
        templates: &[QuestTemplate],
    ) -> Result<usize, StreakbotError> {
        queries::quests::seed_templates(self.db()?, templates).await
    }

    async fn list_quest_templates(&self) -> Result<Vec<QuestTemplate>, StreakbotError> {
        queries::quests::list_templates(self.db()?).await
    }

    async fn daily_quests(
        &self,
        chat_id: ChatId,
        date: NaiveDate,
    ) -> Result<Vec<DailyQuest>, StreakbotError> {
        queries::quests::daily_quests(self.db()?, chat_id, date).await
    }

    async fn recent_quest_tags(
        &self,
        chat_id: ChatId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<String>, StreakbotError> {
        queries::quests::recent_tags(self.db()?, chat_id, from, to).await
    }

    async fn assign_daily_quests(
        &self,
        chat_id: ChatId,
        date: NaiveDate,
        templates: &[QuestTemplate],
    ) -> Result<DailyQuestAssignment, StreakbotError> {
        queries::quests::assign_daily(self.db()?, chat_id, date, templates).await
    }

    async fn completed_tags(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<String>, StreakbotError> {
        queries::completions::completed_tags(self.db()?, chat_id, user_id, date).await
    }

    async fn insert_completion(
        &self,
        completion: &QuestCompletion,
    ) -> Result<bool, StreakbotError> {
        queries::completions::insert_completion(self.db()?, completion).await
    }

    async fn quest_scores(&self, chat_id: ChatId) -> Result<Vec<QuestScore>, StreakbotError> {
        queries::completions::quest_scores(self.db()?, chat_id).await
    }

    async fn archived_streaks(
        &self,
        chat_id: ChatId,
        year: i32,
    ) -> Result<Vec<StreakArchiveEntry>, StreakbotError> {
        queries::archive::archived_streaks(self.db()?, chat_id, year).await
    }

    async fn archived_quest_scores(
        &self,
        chat_id: ChatId,
        year: i32,
    ) -> Result<Vec<QuestScore>, StreakbotError> {
        queries::archive::archived_quest_scores(self.db()?, chat_id, year).await
    }

    async fn archive_and_reset(&self, year: i32) -> Result<RolloverSummary, StreakbotError> {
        let summary = queries::archive::archive_and_reset(self.db()?, year).await?;
        info!(
            year,
            streaks_archived = summary.streaks_archived,
            quest_tallies_archived = summary.quest_tallies_archived,
            streaks_reset = summary.streaks_reset,
            completions_cleared = summary.completions_cleared,
            "yearly rollover committed"
        );
        Ok(summary)
    }
}
