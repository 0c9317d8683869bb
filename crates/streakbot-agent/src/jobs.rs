// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic jobs: the daily quest broadcast, the inactivity reminder, and
//! the yearly rollover.
//!
//! Each job walks every registered chat. A failure for one chat is logged
//! and the job moves on to the next.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use rand::seq::SliceRandom;
use streakbot_core::types::{ChatId, OutboundMessage, RolloverSummary};
use streakbot_core::{ChannelAdapter, StorageAdapter, StreakbotError};
use streakbot_cron::CronJob;
use streakbot_engine::{reports, select_quests};
use tracing::{debug, info, warn};

use crate::recording;
use crate::retry::with_retry;
use crate::settings::AgentSettings;

/// Shared handles for the periodic jobs.
#[derive(Clone)]
pub struct Jobs {
    channel: Arc<dyn ChannelAdapter>,
    storage: Arc<dyn StorageAdapter>,
    settings: AgentSettings,
}

impl Jobs {
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        storage: Arc<dyn StorageAdapter>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            channel,
            storage,
            settings,
        }
    }

    /// Assign and announce today's quests in every chat.
    ///
    /// Returns the number of chats that received an announcement. A chat that
    /// already has today's assignment keeps it and is not announced again.
    pub async fn broadcast_quests(&self, now: DateTime<Utc>) -> Result<usize, StreakbotError> {
        let today = self.settings.zone.date_of(now);
        let chats = with_retry(&self.settings.retry, "list_chats", || self.storage.list_chats())
            .await?;
        let mut announced = 0;
        for chat in chats {
            match self.broadcast_to(chat.chat_id, today).await {
                Ok(true) => announced += 1,
                Ok(false) => {}
                Err(e) => warn!(chat_id = %chat.chat_id, error = %e, "quest broadcast failed for chat"),
            }
        }
        info!(%today, announced, "quest broadcast finished");
        Ok(announced)
    }

    async fn broadcast_to(&self, chat_id: ChatId, today: NaiveDate) -> Result<bool, StreakbotError> {
        let retry = &self.settings.retry;
        let existing =
            with_retry(retry, "daily_quests", || self.storage.daily_quests(chat_id, today)).await?;
        if !existing.is_empty() {
            debug!(chat_id = %chat_id, "quests already assigned today");
            return Ok(false);
        }

        let recent: HashSet<String> = match self.recent_window(today) {
            Some((from, to)) => with_retry(retry, "recent_quest_tags", || {
                self.storage.recent_quest_tags(chat_id, from, to)
            })
            .await?
            .into_iter()
            .collect(),
            None => HashSet::new(),
        };
        let catalog =
            with_retry(retry, "list_quest_templates", || self.storage.list_quest_templates())
                .await?;
        let picks = {
            let mut rng = rand::thread_rng();
            select_quests(&catalog, &recent, self.settings.quests_per_day, &mut rng)
        };
        if picks.is_empty() {
            warn!(chat_id = %chat_id, "quest catalog is empty, nothing to assign");
            return Ok(false);
        }

        let assignment = with_retry(retry, "assign_daily_quests", || {
            self.storage.assign_daily_quests(chat_id, today, &picks)
        })
        .await?;
        if !assignment.created {
            return Ok(false);
        }

        let text = reports::quest_announcement(&assignment.quests, self.settings.quests.cutoff_hour);
        self.channel
            .send(OutboundMessage::markdown(chat_id, text))
            .await?;
        info!(chat_id = %chat_id, quests = assignment.quests.len(), "daily quests announced");
        Ok(true)
    }

    /// The days whose tags are avoided: `[today - n, today - 1]`.
    fn recent_window(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let n = self.settings.exclude_recent_days;
        if n == 0 {
            return None;
        }
        let from = today.checked_sub_days(Days::new(u64::from(n)))?;
        let to = today.checked_sub_days(Days::new(1))?;
        Some((from, to))
    }

    /// Nudge the users of every chat who have no activity today.
    ///
    /// Returns the number of chats a reminder was sent to.
    pub async fn send_reminders(&self, now: DateTime<Utc>) -> Result<usize, StreakbotError> {
        let today = self.settings.zone.date_of(now);
        let chats = with_retry(&self.settings.retry, "list_chats", || self.storage.list_chats())
            .await?;
        let mut sent = 0;
        for chat in chats {
            match self.remind(chat.chat_id, today).await {
                Ok(true) => sent += 1,
                Ok(false) => {}
                Err(e) => warn!(chat_id = %chat.chat_id, error = %e, "reminder failed for chat"),
            }
        }
        info!(%today, sent, "inactivity reminders finished");
        Ok(sent)
    }

    async fn remind(&self, chat_id: ChatId, today: NaiveDate) -> Result<bool, StreakbotError> {
        let records = with_retry(&self.settings.retry, "list_streaks", || {
            self.storage.list_streaks(chat_id)
        })
        .await?;
        let inactive: Vec<_> = records
            .into_iter()
            .filter(|r| r.last_activity != Some(today))
            .collect();
        if inactive.is_empty() {
            debug!(chat_id = %chat_id, "everyone is active today");
            return Ok(false);
        }

        let quote = self
            .settings
            .quotes
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default();
        let text = reports::inactivity_reminder(&quote, &inactive);
        self.channel
            .send(OutboundMessage::markdown(chat_id, text))
            .await?;
        info!(chat_id = %chat_id, inactive = inactive.len(), "inactivity reminder sent");
        Ok(true)
    }

    /// Archive the cycle under `year` and reset it.
    pub async fn rollover(&self, year: i32) -> Result<RolloverSummary, StreakbotError> {
        with_retry(&self.settings.retry, "archive_and_reset", || {
            self.storage.archive_and_reset(year)
        })
        .await
    }
}

/// Which periodic job a [`ScheduledJob`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    QuestBroadcast,
    Reminder,
    Rollover,
}

impl JobKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::QuestBroadcast => "quest_broadcast",
            Self::Reminder => "reminder",
            Self::Rollover => "rollover",
        }
    }
}

/// Binds a [`JobKind`] to the shared [`Jobs`] for the cron scheduler.
pub struct ScheduledJob {
    kind: JobKind,
    jobs: Jobs,
}

impl ScheduledJob {
    pub fn new(kind: JobKind, jobs: Jobs) -> Self {
        Self { kind, jobs }
    }
}

#[async_trait]
impl CronJob for ScheduledJob {
    async fn run(&self, fired_at: DateTime<Utc>) -> Result<(), StreakbotError> {
        let result = match self.kind {
            JobKind::QuestBroadcast => self.jobs.broadcast_quests(fired_at).await.map(|_| ()),
            JobKind::Reminder => self.jobs.send_reminders(fired_at).await.map(|_| ()),
            JobKind::Rollover => {
                let year = self.jobs.settings.zone.year_of(fired_at);
                self.jobs.rollover(year).await.map(|summary| {
                    info!(
                        year = summary.year,
                        streaks_archived = summary.streaks_archived,
                        quest_tallies_archived = summary.quest_tallies_archived,
                        "yearly rollover finished"
                    );
                })
            }
        };
        recording::record_job_run(self.kind.name(), result.is_ok());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streakbot_core::types::QuestTemplate;
    use streakbot_test_utils::{MemoryStorage, MockChannel};
    use tracing_test::traced_test;

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn job_futures_are_send() {
        let jobs = Jobs::new(
            Arc::new(MockChannel::new()),
            Arc::new(MemoryStorage::new()),
            AgentSettings::default(),
        );
        assert_send(&jobs.broadcast_quests(Utc::now()));
        assert_send(&jobs.send_reminders(Utc::now()));
    }

    #[test]
    fn recent_window_covers_previous_days() {
        let jobs = Jobs::new(
            Arc::new(MockChannel::new()),
            Arc::new(MemoryStorage::new()),
            AgentSettings {
                exclude_recent_days: 3,
                ..AgentSettings::default()
            },
        );
        let today = NaiveDate::from_ymd_opt(2026, 6, 10).unwrap();
        assert_eq!(
            jobs.recent_window(today),
            Some((
                NaiveDate::from_ymd_opt(2026, 6, 7).unwrap(),
                NaiveDate::from_ymd_opt(2026, 6, 9).unwrap()
            ))
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn failing_chat_does_not_stop_the_broadcast() {
        let channel = Arc::new(MockChannel::new());
        let storage = Arc::new(MemoryStorage::new());
        storage
            .seed_quest_templates(&[QuestTemplate::new("Run", "run")])
            .await
            .unwrap();
        storage.register_chat(ChatId(-1), Some("A")).await.unwrap();
        storage.register_chat(ChatId(-2), Some("B")).await.unwrap();
        channel.fail_next_sends(1);

        let jobs = Jobs::new(channel.clone(), storage, AgentSettings::default());
        let announced = jobs.broadcast_quests(Utc::now()).await.unwrap();
        assert_eq!(announced, 1);
        assert_eq!(channel.sent_count().await, 1);
        assert!(logs_contain("quest broadcast failed for chat"));
    }
}
