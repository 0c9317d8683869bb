// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for Streakbot.
//!
//! Implements [`ChannelAdapter`] for the Telegram Bot API via teloxide:
//! long polling for group messages, MarkdownV2 replies with a plain-text
//! fallback, and emoji reactions.

pub mod handler;

use async_trait::async_trait;
use streakbot_config::model::TelegramConfig;
use streakbot_core::error::StreakbotError;
use streakbot_core::traits::{ChannelAdapter, PluginAdapter};
use streakbot_core::types::{
    AdapterType, ChannelCapabilities, ChatId, HealthStatus, InboundMessage, MessageId,
    OutboundMessage, ParseMode,
};
use teloxide::prelude::*;
use teloxide::types::{ReactionType, ReplyParameters};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Telegram's hard limit on message length.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

/// Telegram channel adapter implementing [`ChannelAdapter`].
pub struct TelegramChannel {
    bot: Bot,
    config: TelegramConfig,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: TelegramConfig) -> Result<Self, StreakbotError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            StreakbotError::Config("telegram.bot_token is required to serve".into())
        })?;

        if token.trim().is_empty() {
            return Err(StreakbotError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let bot = Bot::new(token);
        let (inbound_tx, inbound_rx) = mpsc::channel(100);

        Ok(Self {
            bot,
            config,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }

    /// The emoji configured for reactions.
    pub fn reaction_emoji(&self) -> &str {
        &self.config.reaction_emoji
    }

    async fn send_chunk(
        &self,
        chat_id: teloxide::types::ChatId,
        text: &str,
        reply_to: Option<teloxide::types::MessageId>,
        markdown: bool,
    ) -> Result<Message, teloxide::RequestError> {
        let mut request = self.bot.send_message(chat_id, text);
        if let Some(id) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(id).allow_sending_without_reply());
        }
        if markdown {
            request = request.parse_mode(teloxide::types::ParseMode::MarkdownV2);
        }
        request.await
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, StreakbotError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), StreakbotError> {
        debug!("Telegram channel shutting down");
        if let Some(handle) = &self.polling_handle {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_reactions: true,
            supports_markdown: true,
            max_message_length: Some(MAX_MESSAGE_LENGTH),
        }
    }

    async fn connect(&mut self) -> Result<(), StreakbotError> {
        if self.polling_handle.is_some() {
            return Ok(());
        }

        let bot = self.bot.clone();
        let tx = self.inbound_tx.clone();

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let handler = Update::filter_message().endpoint(move |msg: Message| {
                let tx = tx.clone();
                async move {
                    if !handler::is_relevant(&msg) {
                        debug!(msg_id = msg.id.0, "ignoring message without text");
                        return respond(());
                    }
                    let inbound = handler::to_inbound_message(&msg);
                    if tx.send(inbound).await.is_err() {
                        warn!("inbound queue closed, dropping message");
                    }
                    respond(())
                }
            });

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, StreakbotError> {
        let chat_id = teloxide::types::ChatId(msg.chat_id.0);
        let reply_to = msg.reply_to.as_ref().map(parse_message_id).transpose()?;
        let markdown = msg.parse_mode == ParseMode::MarkdownV2;

        let mut last = None;
        for chunk in split_message(&msg.content, MAX_MESSAGE_LENGTH) {
            let sent = match self.send_chunk(chat_id, chunk, reply_to, markdown).await {
                Ok(sent) => sent,
                Err(e) if markdown => {
                    warn!(error = %e, "MarkdownV2 failed, sending as plain text");
                    let plain = streakbot_engine::markdown::to_plain(chunk);
                    self.send_chunk(chat_id, &plain, reply_to, false)
                        .await
                        .map_err(send_error)?
                }
                Err(e) => return Err(send_error(e)),
            };
            last = Some(sent.id);
        }

        last.map(|id| MessageId(id.0.to_string()))
            .ok_or_else(|| StreakbotError::InvalidInput("cannot send an empty message".into()))
    }

    async fn receive(&self) -> Result<InboundMessage, StreakbotError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or(StreakbotError::ChannelClosed)
    }

    async fn set_reaction(
        &self,
        chat_id: ChatId,
        message_id: &MessageId,
        emoji: &str,
    ) -> Result<(), StreakbotError> {
        let msg_id = parse_message_id(message_id)?;
        self.bot
            .set_message_reaction(teloxide::types::ChatId(chat_id.0), msg_id)
            .reaction(vec![ReactionType::Emoji {
                emoji: emoji.to_string(),
            }])
            .await
            .map_err(|e| StreakbotError::Channel {
                message: format!("failed to set reaction: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(())
    }
}

fn parse_message_id(id: &MessageId) -> Result<teloxide::types::MessageId, StreakbotError> {
    id.0.parse::<i32>()
        .map(teloxide::types::MessageId)
        .map_err(|e| StreakbotError::Channel {
            message: format!("invalid message_id {}: {e}", id.0),
            source: None,
        })
}

fn send_error(e: teloxide::RequestError) -> StreakbotError {
    StreakbotError::Channel {
        message: format!("failed to send message: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Splits `content` into pieces of at most `max_len` characters.
///
/// Breaks on line boundaries where possible; a single line longer than the
/// limit is cut at a character boundary.
pub fn split_message(content: &str, max_len: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = content;
    while rest.chars().count() > max_len {
        let limit = rest
            .char_indices()
            .nth(max_len)
            .map_or(rest.len(), |(i, _)| i);
        let cut = match rest[..limit].rfind('\n') {
            Some(nl) if nl > 0 => nl + 1,
            _ => limit,
        };
        chunks.push(&rest[..cut]);
        rest = &rest[cut..];
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}
