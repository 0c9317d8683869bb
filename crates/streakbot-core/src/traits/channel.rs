// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the messaging platform (Telegram).

use async_trait::async_trait;

use crate::error::StreakbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCapabilities, ChatId, InboundMessage, MessageId, OutboundMessage};

/// Adapter for the messaging platform the bot lives in.
///
/// `receive` may be called from several worker tasks at once; each inbound
/// message is handed to exactly one caller.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), StreakbotError>;

    /// Sends a message through the channel.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, StreakbotError>;

    /// Receives the next inbound message from the channel.
    async fn receive(&self) -> Result<InboundMessage, StreakbotError>;

    /// Sets an emoji reaction on an existing message.
    async fn set_reaction(
        &self,
        chat_id: ChatId,
        message_id: &MessageId,
        emoji: &str,
    ) -> Result<(), StreakbotError>;
}
