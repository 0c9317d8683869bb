// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routes one inbound message through commands, streaks, and quests.

use std::sync::Arc;

use streakbot_core::types::{InboundMessage, OutboundMessage, QuestCompletion, UserId};
use streakbot_core::{ChannelAdapter, StorageAdapter, StreakbotError};
use streakbot_engine::{
    Command, QuestOutcome, StreakEvent, has_streak_marker, parse_command, reports,
    streak_mutation,
};
use tracing::{debug, info, warn};

use crate::recording;
use crate::retry::with_retry;
use crate::settings::AgentSettings;

/// What handling a message did, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Empty text or no sender; nothing was touched.
    pub skipped: bool,
    pub command: Option<Command>,
    /// `Some(accepted)` when the text carried a streak marker.
    pub streak_accepted: Option<bool>,
    pub quest: Option<QuestOutcome>,
    /// Whether a completion row was written for `quest`.
    pub completion_recorded: bool,
}

/// Applies the bot's rules to inbound messages.
pub struct Dispatcher {
    channel: Arc<dyn ChannelAdapter>,
    storage: Arc<dyn StorageAdapter>,
    settings: AgentSettings,
}

impl Dispatcher {
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

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Handle one message end to end.
    ///
    /// An error means a store call failed after retries; whatever was
    /// committed before it stays committed.
    pub async fn handle(&self, msg: &InboundMessage) -> Result<DispatchReport, StreakbotError> {
        let mut report = DispatchReport::default();
        let text = msg.text.as_deref().map(str::trim).unwrap_or_default();
        let Some(user_id) = msg.sender_id else {
            report.skipped = true;
            return Ok(report);
        };
        if text.is_empty() {
            report.skipped = true;
            return Ok(report);
        }

        if let Some(command) = parse_command(text) {
            self.answer_command(msg, &command).await?;
            report.command = Some(command);
            return Ok(report);
        }

        let retry = &self.settings.retry;
        if msg.chat_kind.is_group() {
            let title = msg.chat_title.as_deref();
            with_retry(retry, "register_chat", || {
                self.storage.register_chat(msg.chat_id, title)
            })
            .await?;
        }

        let name = msg.sender_name.as_str();
        with_retry(retry, "ensure_streak_record", || {
            self.storage.ensure_streak_record(msg.chat_id, user_id, name)
        })
        .await?;

        let mut reacted = false;
        if has_streak_marker(text) {
            let accepted = self.apply_streak(msg, user_id).await?;
            report.streak_accepted = Some(accepted);
            if accepted {
                self.react(msg).await;
                reacted = true;
            }
        }

        if self.settings.quests.may_complete(text) {
            let (outcome, recorded) = self.apply_quest(msg, user_id, text).await?;
            if recorded && !reacted {
                self.react(msg).await;
            }
            report.completion_recorded = recorded;
            report.quest = Some(outcome);
        }

        Ok(report)
    }

    async fn apply_streak(
        &self,
        msg: &InboundMessage,
        user_id: UserId,
    ) -> Result<bool, StreakbotError> {
        let event = StreakEvent {
            chat_id: msg.chat_id,
            user_id,
            display_name: msg.sender_name.clone(),
            date: self.settings.zone.date_of(msg.timestamp),
        };
        let policy = self.settings.streaks;
        let eval = with_retry(&self.settings.retry, "update_streak", || {
            self.storage.update_streak(
                msg.chat_id,
                user_id,
                &msg.sender_name,
                streak_mutation(policy, event.clone()),
            )
        })
        .await?;

        recording::record_streak_marker(eval.accepted);
        if eval.accepted {
            info!(
                chat_id = %msg.chat_id,
                user_id = %user_id,
                streak = eval.record.streak,
                daily_count = eval.record.daily_count,
                "streak marker accepted"
            );
        } else {
            debug!(chat_id = %msg.chat_id, user_id = %user_id, "daily streak cap reached");
        }
        Ok(eval.accepted)
    }

    async fn apply_quest(
        &self,
        msg: &InboundMessage,
        user_id: UserId,
        text: &str,
    ) -> Result<(QuestOutcome, bool), StreakbotError> {
        let retry = &self.settings.retry;
        let today = self.settings.zone.date_of(msg.timestamp);

        let assigned = with_retry(retry, "daily_quests", || {
            self.storage.daily_quests(msg.chat_id, today)
        })
        .await?;
        if assigned.is_empty() {
            return Ok((QuestOutcome::NoMatch, false));
        }
        let completed = with_retry(retry, "completed_tags", || {
            self.storage.completed_tags(msg.chat_id, user_id, today)
        })
        .await?;

        let hour = self.settings.zone.hour_of(msg.timestamp);
        let outcome = self
            .settings
            .quests
            .try_complete(text, hour, &assigned, &completed);

        match &outcome {
            QuestOutcome::Completed(quest) => {
                let completion = QuestCompletion {
                    chat_id: msg.chat_id,
                    user_id,
                    display_name: msg.sender_name.clone(),
                    tag: quest.tag.clone(),
                    date: today,
                };
                let inserted = with_retry(retry, "insert_completion", || {
                    self.storage.insert_completion(&completion)
                })
                .await?;
                if !inserted {
                    debug!(tag = quest.tag.as_str(), "completion raced with an earlier one");
                    return Ok((QuestOutcome::AlreadyCompleted(quest.tag.clone()), false));
                }
                recording::record_quest_completion();
                info!(chat_id = %msg.chat_id, user_id = %user_id, tag = quest.tag.as_str(), "quest completed");
                self.reply(
                    msg,
                    OutboundMessage::markdown(
                        msg.chat_id,
                        reports::quest_completed(&msg.sender_name, quest),
                    ),
                )
                .await;
                Ok((outcome, true))
            }
            QuestOutcome::TooLate(quest) => {
                debug!(tag = quest.tag.as_str(), hour, "quest completion after cutoff");
                let notice = reports::cutoff_notice(
                    self.settings.quests.cutoff_hour,
                    self.settings.utc_offset_hours(),
                );
                self.reply(msg, OutboundMessage::markdown(msg.chat_id, notice))
                    .await;
                Ok((outcome, false))
            }
            QuestOutcome::AlreadyCompleted(tag) => {
                debug!(tag = tag.as_str(), user_id = %user_id, "quest already completed today");
                Ok((outcome, false))
            }
            QuestOutcome::NoMatch => Ok((outcome, false)),
        }
    }

    async fn answer_command(
        &self,
        msg: &InboundMessage,
        command: &Command,
    ) -> Result<(), StreakbotError> {
        let retry = &self.settings.retry;
        let chat_id = msg.chat_id;
        let text = match command {
            Command::Streaks(None) => {
                let records =
                    with_retry(retry, "list_streaks", || self.storage.list_streaks(chat_id)).await?;
                reports::current_streaks(&records)
            }
            Command::Streaks(Some(year)) => {
                let year = *year;
                let entries = with_retry(retry, "archived_streaks", || {
                    self.storage.archived_streaks(chat_id, year)
                })
                .await?;
                reports::archived_streaks(year, &entries)
            }
            Command::Quest => {
                let today = self.settings.zone.date_of(msg.timestamp);
                let quests = with_retry(retry, "daily_quests", || {
                    self.storage.daily_quests(chat_id, today)
                })
                .await?;
                reports::todays_quests(&quests)
            }
            Command::QuestScore(None) => {
                let scores =
                    with_retry(retry, "quest_scores", || self.storage.quest_scores(chat_id)).await?;
                reports::quest_leaderboard(&scores)
            }
            Command::QuestScore(Some(year)) => {
                let year = *year;
                let scores = with_retry(retry, "archived_quest_scores", || {
                    self.storage.archived_quest_scores(chat_id, year)
                })
                .await?;
                reports::archived_leaderboard(year, &scores)
            }
            Command::Help => reports::help(self.settings.quests.cutoff_hour),
            Command::Unknown(name) => {
                debug!(command = name.as_str(), "ignoring unknown command");
                return Ok(());
            }
        };
        self.send(OutboundMessage::markdown(chat_id, text)).await;
        Ok(())
    }

    async fn react(&self, msg: &InboundMessage) {
        if let Err(e) = self
            .channel
            .set_reaction(msg.chat_id, &msg.id, &self.settings.reaction_emoji)
            .await
        {
            warn!(chat_id = %msg.chat_id, error = %e, "failed to set reaction");
        }
    }

    async fn reply(&self, msg: &InboundMessage, out: OutboundMessage) {
        self.send(out.in_reply_to(msg.id.clone())).await;
    }

    async fn send(&self, out: OutboundMessage) {
        let chat_id = out.chat_id;
        if let Err(e) = self.channel.send(out).await {
            warn!(chat_id = %chat_id, error = %e, "failed to send message");
        }
    }
}
