// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of Telegram updates into channel-agnostic [`InboundMessage`]s.

use streakbot_core::types::{ChatId, ChatKind, InboundMessage, MessageId, UserId};
use teloxide::types::Message;

/// Maps the Telegram chat type onto [`ChatKind`].
pub fn chat_kind(msg: &Message) -> ChatKind {
    let chat = &msg.chat;
    if chat.is_private() {
        ChatKind::Private
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else if chat.is_group() {
        ChatKind::Group
    } else {
        ChatKind::Channel
    }
}

/// The message text, or the caption of a media message.
pub fn message_text(msg: &Message) -> Option<&str> {
    msg.text().or_else(|| msg.caption())
}

/// Whether the update carries anything the dispatcher can use.
///
/// Service messages (joins, pins) and stickers have neither text nor
/// caption and are dropped here.
pub fn is_relevant(msg: &Message) -> bool {
    message_text(msg).is_some_and(|t| !t.trim().is_empty())
}

/// Converts a Telegram message into an [`InboundMessage`].
pub fn to_inbound_message(msg: &Message) -> InboundMessage {
    let sender = msg.from.as_ref();
    InboundMessage {
        id: MessageId(msg.id.0.to_string()),
        chat_id: ChatId(msg.chat.id.0),
        chat_kind: chat_kind(msg),
        chat_title: msg.chat.title().map(str::to_string),
        sender_id: sender.and_then(|u| i64::try_from(u.id.0).ok()).map(UserId),
        sender_name: sender.map(|u| u.full_name()).unwrap_or_default(),
        text: message_text(msg).map(str::to_string),
        timestamp: msg.date,
    }
}
