// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage adapter.
//!
//! Mirrors the ordering and idempotence rules of the SQLite adapter closely
//! enough for agent tests. One store-wide lock serializes every operation,
//! which also makes `update_streak` atomic.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use streakbot_core::types::{
    ChatId, DailyQuest, DailyQuestAssignment, GroupChat, QuestCompletion, QuestScore,
    QuestTemplate, RolloverSummary, StreakArchiveEntry, StreakEvaluation, StreakMutation,
    StreakRecord, UserId,
};
use streakbot_core::{AdapterType, HealthStatus, PluginAdapter, StorageAdapter, StreakbotError};

#[derive(Default)]
struct State {
    chats: BTreeMap<ChatId, Option<String>>,
    streaks: BTreeMap<(ChatId, UserId), StreakRecord>,
    templates: BTreeMap<String, QuestTemplate>,
    daily: BTreeMap<(ChatId, NaiveDate), Vec<DailyQuest>>,
    /// Insertion order stands in for the autoincrement id.
    completions: Vec<QuestCompletion>,
    streak_archive: BTreeMap<(ChatId, UserId, i32), StreakArchiveEntry>,
    quest_archive: BTreeMap<(ChatId, UserId, i32), QuestScore>,
}

/// Storage adapter keeping everything in process memory.
#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
    failing_updates: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` calls to `update_streak` fail with a retryable error.
    pub fn fail_next_updates(&self, n: usize) {
        self.failing_updates.store(n, Ordering::SeqCst);
    }

    /// All completions currently stored, oldest first.
    pub async fn completions(&self) -> Vec<QuestCompletion> {
        self.state.lock().await.completions.clone()
    }
}

fn sort_by_score<T>(rows: &mut [T], key: impl Fn(&T) -> (u32, String)) {
    rows.sort_by(|a, b| {
        let (sa, na) = key(a);
        let (sb, nb) = key(b);
        sb.cmp(&sa).then_with(|| na.to_lowercase().cmp(&nb.to_lowercase()))
    });
}

/// Per-user tallies in first-completion order, with each user's latest name.
fn tallies(completions: &[QuestCompletion], chat_id: Option<ChatId>) -> Vec<(ChatId, QuestScore)> {
    let mut out: Vec<(ChatId, QuestScore)> = Vec::new();
    for c in completions
        .iter()
        .filter(|c| chat_id.is_none_or(|id| id == c.chat_id))
    {
        match out
            .iter_mut()
            .find(|(chat, s)| *chat == c.chat_id && s.user_id == c.user_id)
        {
            Some((_, score)) => {
                score.completions += 1;
                score.display_name.clone_from(&c.display_name);
            }
            None => out.push((
                c.chat_id,
                QuestScore {
                    user_id: c.user_id,
                    display_name: c.display_name.clone(),
                    completions: 1,
                },
            )),
        }
    }
    out
}

#[async_trait]
impl PluginAdapter for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, StreakbotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), StreakbotError> {
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn initialize(&self) -> Result<(), StreakbotError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), StreakbotError> {
        Ok(())
    }

    async fn register_chat(
        &self,
        chat_id: ChatId,
        title: Option<&str>,
    ) -> Result<(), StreakbotError> {
        let mut state = self.state.lock().await;
        let entry = state.chats.entry(chat_id).or_default();
        if let Some(title) = title {
            *entry = Some(title.to_string());
        }
        Ok(())
    }

    async fn list_chats(&self) -> Result<Vec<GroupChat>, StreakbotError> {
        let state = self.state.lock().await;
        Ok(state
            .chats
            .iter()
            .map(|(chat_id, title)| GroupChat {
                chat_id: *chat_id,
                title: title.clone(),
            })
            .collect())
    }

    async fn ensure_streak_record(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        display_name: &str,
    ) -> Result<StreakRecord, StreakbotError> {
        let mut state = self.state.lock().await;
        let record = state
            .streaks
            .entry((chat_id, user_id))
            .or_insert_with(|| StreakRecord::registered(chat_id, user_id, display_name));
        record.display_name = display_name.to_string();
        Ok(record.clone())
    }

    async fn update_streak(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        display_name: &str,
        mutation: StreakMutation,
    ) -> Result<StreakEvaluation, StreakbotError> {
        if self
            .failing_updates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StreakbotError::storage("database is locked"));
        }

        let mut state = self.state.lock().await;
        let current = state.streaks.get(&(chat_id, user_id)).cloned();
        let mut eval = mutation(current);
        eval.record.chat_id = chat_id;
        eval.record.user_id = user_id;
        eval.record.display_name = display_name.to_string();
        state.streaks.insert((chat_id, user_id), eval.record.clone());
        Ok(eval)
    }

    async fn list_streaks(&self, chat_id: ChatId) -> Result<Vec<StreakRecord>, StreakbotError> {
        let state = self.state.lock().await;
        let mut rows: Vec<StreakRecord> = state
            .streaks
            .values()
            .filter(|r| r.chat_id == chat_id)
            .cloned()
            .collect();
        sort_by_score(&mut rows, |r| (r.streak, r.display_name.clone()));
        Ok(rows)
    }

    async fn seed_quest_templates(
        &self,
        templates: &[QuestTemplate],
    ) -> Result<usize, StreakbotError> {
        let mut state = self.state.lock().await;
        let mut inserted = 0;
        for t in templates {
            if !state.templates.contains_key(&t.tag) {
                state.templates.insert(t.tag.clone(), t.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn list_quest_templates(&self) -> Result<Vec<QuestTemplate>, StreakbotError> {
        Ok(self.state.lock().await.templates.values().cloned().collect())
    }

    async fn daily_quests(
        &self,
        chat_id: ChatId,
        date: NaiveDate,
    ) -> Result<Vec<DailyQuest>, StreakbotError> {
        let state = self.state.lock().await;
        Ok(state.daily.get(&(chat_id, date)).cloned().unwrap_or_default())
    }

    async fn recent_quest_tags(
        &self,
        chat_id: ChatId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<String>, StreakbotError> {
        if from > to {
            return Ok(Vec::new());
        }
        let state = self.state.lock().await;
        let tags: HashSet<String> = state
            .daily
            .range((chat_id, from)..=(chat_id, to))
            .flat_map(|(_, quests)| quests.iter().map(|q| q.tag.clone()))
            .collect();
        let mut tags: Vec<String> = tags.into_iter().collect();
        tags.sort();
        Ok(tags)
    }

    async fn assign_daily_quests(
        &self,
        chat_id: ChatId,
        date: NaiveDate,
        templates: &[QuestTemplate],
    ) -> Result<DailyQuestAssignment, StreakbotError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.daily.get(&(chat_id, date)) {
            return Ok(DailyQuestAssignment {
                quests: existing.clone(),
                created: false,
            });
        }
        let quests: Vec<DailyQuest> = templates
            .iter()
            .enumerate()
            .map(|(i, t)| DailyQuest {
                chat_id,
                date,
                position: i as u8,
                description: t.description.clone(),
                tag: t.tag.clone(),
            })
            .collect();
        if !quests.is_empty() {
            state.daily.insert((chat_id, date), quests.clone());
        }
        let created = !quests.is_empty();
        Ok(DailyQuestAssignment { quests, created })
    }

    async fn completed_tags(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<String>, StreakbotError> {
        let state = self.state.lock().await;
        Ok(state
            .completions
            .iter()
            .filter(|c| c.chat_id == chat_id && c.user_id == user_id && c.date == date)
            .map(|c| c.tag.clone())
            .collect())
    }

    async fn insert_completion(
        &self,
        completion: &QuestCompletion,
    ) -> Result<bool, StreakbotError> {
        let mut state = self.state.lock().await;
        let exists = state.completions.iter().any(|c| {
            c.chat_id == completion.chat_id
                && c.user_id == completion.user_id
                && c.tag == completion.tag
                && c.date == completion.date
        });
        if exists {
            return Ok(false);
        }
        state.completions.push(completion.clone());
        Ok(true)
    }

    async fn quest_scores(&self, chat_id: ChatId) -> Result<Vec<QuestScore>, StreakbotError> {
        let state = self.state.lock().await;
        let mut scores: Vec<QuestScore> = tallies(&state.completions, Some(chat_id))
            .into_iter()
            .map(|(_, s)| s)
            .collect();
        // Stable sort keeps first-completion order among ties.
        scores.sort_by(|a, b| b.completions.cmp(&a.completions));
        Ok(scores)
    }

    async fn archived_streaks(
        &self,
        chat_id: ChatId,
        year: i32,
    ) -> Result<Vec<StreakArchiveEntry>, StreakbotError> {
        let state = self.state.lock().await;
        let mut rows: Vec<StreakArchiveEntry> = state
            .streak_archive
            .values()
            .filter(|e| e.chat_id == chat_id && e.year == year)
            .cloned()
            .collect();
        sort_by_score(&mut rows, |e| (e.streak, e.display_name.clone()));
        Ok(rows)
    }

    async fn archived_quest_scores(
        &self,
        chat_id: ChatId,
        year: i32,
    ) -> Result<Vec<QuestScore>, StreakbotError> {
        let state = self.state.lock().await;
        let mut rows: Vec<QuestScore> = state
            .quest_archive
            .iter()
            .filter(|((chat, _, y), _)| *chat == chat_id && *y == year)
            .map(|(_, s)| s.clone())
            .collect();
        sort_by_score(&mut rows, |s| (s.completions, s.display_name.clone()));
        Ok(rows)
    }

    async fn archive_and_reset(&self, year: i32) -> Result<RolloverSummary, StreakbotError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let mut summary = RolloverSummary {
            year,
            ..RolloverSummary::default()
        };

        for record in state.streaks.values() {
            let key = (record.chat_id, record.user_id, year);
            if !state.streak_archive.contains_key(&key) {
                state.streak_archive.insert(
                    key,
                    StreakArchiveEntry {
                        chat_id: record.chat_id,
                        user_id: record.user_id,
                        display_name: record.display_name.clone(),
                        streak: record.streak,
                        year,
                    },
                );
                summary.streaks_archived += 1;
            }
        }

        for (chat_id, score) in tallies(&state.completions, None) {
            let key = (chat_id, score.user_id, year);
            if !state.quest_archive.contains_key(&key) {
                state.quest_archive.insert(key, score);
                summary.quest_tallies_archived += 1;
            }
        }

        for record in state.streaks.values_mut() {
            if record.streak != 0 || record.daily_count != 0 || record.last_activity.is_some() {
                record.streak = 0;
                record.daily_count = 0;
                record.last_activity = None;
                summary.streaks_reset += 1;
            }
        }

        summary.completions_cleared = state.completions.len();
        state.completions.clear();
        Ok(summary)
    }
}
