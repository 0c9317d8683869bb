// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the adapters, the engines, and the agent.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a chat on the messaging platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a user on the messaging platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a message within a chat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
}

/// The kind of chat a message arrived in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    /// Group-like chats are registered for the periodic jobs.
    pub fn is_group(self) -> bool {
        matches!(self, Self::Group | Self::Supergroup)
    }
}

// --- Channel types ---

/// An inbound message received from a channel adapter.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub chat_title: Option<String>,
    /// `None` for posts without a user (channel posts, service messages).
    pub sender_id: Option<UserId>,
    pub sender_name: String,
    /// Message text, or the caption of a media message.
    pub text: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Formatting applied by the channel when delivering a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    #[default]
    Plain,
    /// Content is already escaped for Telegram MarkdownV2.
    MarkdownV2,
}

/// An outbound message to be sent via a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: ChatId,
    pub content: String,
    pub reply_to: Option<MessageId>,
    pub parse_mode: ParseMode,
}

impl OutboundMessage {
    /// A plain-text message to a chat.
    pub fn text(chat_id: ChatId, content: impl Into<String>) -> Self {
        Self {
            chat_id,
            content: content.into(),
            reply_to: None,
            parse_mode: ParseMode::Plain,
        }
    }

    /// A MarkdownV2-formatted message to a chat.
    pub fn markdown(chat_id: ChatId, content: impl Into<String>) -> Self {
        Self {
            parse_mode: ParseMode::MarkdownV2,
            ..Self::text(chat_id, content)
        }
    }

    /// Reply to a specific message.
    pub fn in_reply_to(mut self, message_id: MessageId) -> Self {
        self.reply_to = Some(message_id);
        self
    }
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone)]
pub struct ChannelCapabilities {
    pub supports_reactions: bool,
    pub supports_markdown: bool,
    pub max_message_length: Option<usize>,
}

// --- Domain records ---

/// Per-(chat, user) streak state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub display_name: String,
    pub streak: u32,
    pub last_activity: Option<NaiveDate>,
    /// Accepted increments granted on `last_activity`.
    pub daily_count: u8,
}

impl StreakRecord {
    /// A freshly registered user: no activity yet.
    pub fn registered(chat_id: ChatId, user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            chat_id,
            user_id,
            display_name: display_name.into(),
            streak: 0,
            last_activity: None,
            daily_count: 0,
        }
    }
}

/// Result of evaluating one streak marker against the stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakEvaluation {
    /// The record to persist. Equal to the input (name aside) when rejected.
    pub record: StreakRecord,
    pub accepted: bool,
}

/// Pure mutation run by the store inside its atomic read-modify-write.
///
/// Receives the current row (`None` if the user has never been seen) and
/// returns the decision. Must not perform I/O.
pub type StreakMutation = Box<dyn FnOnce(Option<StreakRecord>) -> StreakEvaluation + Send>;

/// One character of a quest tag: a letter, a digit, or `_`.
///
/// Message matching and config validation both build on this class, so a
/// tag that validates can always be matched as `#tag`.
pub const QUEST_TAG_CHAR_CLASS: &str = r"[\p{L}\p{N}_]";

static QUEST_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{QUEST_TAG_CHAR_CLASS}+$")).expect("valid quest tag pattern")
});

/// Whether `tag` is non-empty and made only of [`QUEST_TAG_CHAR_CLASS`].
pub fn is_valid_quest_tag(tag: &str) -> bool {
    QUEST_TAG.is_match(tag)
}

/// A reusable quest definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestTemplate {
    pub description: String,
    /// Lowercase token matched against `#tag` in messages.
    pub tag: String,
}

impl QuestTemplate {
    pub fn new(description: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            tag: tag.into().to_lowercase(),
        }
    }
}

/// A quest assigned to a chat for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyQuest {
    pub chat_id: ChatId,
    pub date: NaiveDate,
    /// Listed order within the day, starting at 0.
    pub position: u8,
    pub description: String,
    pub tag: String,
}

/// The stored assignment for (chat, date) and whether this call created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyQuestAssignment {
    pub quests: Vec<DailyQuest>,
    pub created: bool,
}

/// One user completing one quest on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestCompletion {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub display_name: String,
    pub tag: String,
    pub date: NaiveDate,
}

/// A leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestScore {
    pub user_id: UserId,
    pub display_name: String,
    pub completions: u32,
}

/// A chat the bot has seen group traffic from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupChat {
    pub chat_id: ChatId,
    pub title: Option<String>,
}

/// An archived streak value for one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakArchiveEntry {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub display_name: String,
    pub streak: u32,
    pub year: i32,
}

/// What a yearly rollover did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolloverSummary {
    pub year: i32,
    /// Archive rows newly written (existing rows for the year are kept).
    pub streaks_archived: usize,
    pub quest_tallies_archived: usize,
    pub streaks_reset: usize,
    pub completions_cleared: usize,
}
