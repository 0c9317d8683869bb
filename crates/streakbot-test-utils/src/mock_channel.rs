// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound messages
//! and captured outbound messages and reactions for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, Notify};

use streakbot_core::types::{
    ChannelCapabilities, ChatId, ChatKind, InboundMessage, OutboundMessage, UserId,
};
use streakbot_core::{
    AdapterType, ChannelAdapter, HealthStatus, MessageId, PluginAdapter, StreakbotError,
};

/// A reaction captured by [`MockChannel::set_reaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub emoji: String,
}

/// A mock messaging channel for testing.
///
/// Provides three queues:
/// - **inbound**: Messages injected via `inject_message()` are returned by `receive()`
/// - **sent**: Messages passed to `send()` are captured and retrievable via `sent_messages()`
/// - **reactions**: Calls to `set_reaction()` are captured via `reactions()`
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<InboundMessage>>>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    reactions: Arc<Mutex<Vec<Reaction>>>,
    notify: Arc<Notify>,
    failing_sends: AtomicUsize,
    receive_errors: Mutex<VecDeque<StreakbotError>>,
    closed: AtomicBool,
}

impl MockChannel {
    /// Create a new mock channel with empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            reactions: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            failing_sends: AtomicUsize::new(0),
            receive_errors: Mutex::new(VecDeque::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Inject an inbound message into the receive queue.
    pub async fn inject_message(&self, msg: InboundMessage) {
        self.inbound.lock().await.push_back(msg);
        self.notify.notify_one();
    }

    /// Get all messages that were sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Get the count of sent messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Clear all sent messages.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    /// Get all reactions that were set.
    pub async fn reactions(&self) -> Vec<Reaction> {
        self.reactions.lock().await.clone()
    }

    /// Make the next `n` calls to `send()` fail with a channel error.
    pub fn fail_next_sends(&self, n: usize) {
        self.failing_sends.store(n, Ordering::SeqCst);
    }

    /// Queue an error for a later `receive()` call, ahead of any messages.
    pub async fn inject_receive_error(&self, error: StreakbotError) {
        self.receive_errors.lock().await.push_back(error);
        self.notify.notify_one();
    }

    /// Close the inbound side: once drained, `receive()` returns
    /// [`StreakbotError::ChannelClosed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    fn take_failure(&self) -> bool {
        self.failing_sends
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, StreakbotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), StreakbotError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_reactions: true,
            supports_markdown: true,
            max_message_length: None,
        }
    }

    async fn connect(&mut self) -> Result<(), StreakbotError> {
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, StreakbotError> {
        if self.take_failure() {
            return Err(StreakbotError::Channel {
                message: "mock send failure".into(),
                source: None,
            });
        }
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        self.sent.lock().await.push(msg);
        Ok(MessageId(id))
    }

    async fn receive(&self) -> Result<InboundMessage, StreakbotError> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(error) = self.receive_errors.lock().await.pop_front() {
                return Err(error);
            }
            if let Some(msg) = self.inbound.lock().await.pop_front() {
                return Ok(msg);
            }
            if self.closed.load(Ordering::SeqCst) {
                return Err(StreakbotError::ChannelClosed);
            }
            notified.await;
        }
    }

    async fn set_reaction(
        &self,
        chat_id: ChatId,
        message_id: &MessageId,
        emoji: &str,
    ) -> Result<(), StreakbotError> {
        self.reactions.lock().await.push(Reaction {
            chat_id,
            message_id: message_id.clone(),
            emoji: emoji.to_string(),
        });
        Ok(())
    }
}

/// Build a group message from a user.
pub fn inbound(
    chat_id: i64,
    user_id: i64,
    name: &str,
    text: &str,
    timestamp: DateTime<Utc>,
) -> InboundMessage {
    InboundMessage {
        id: MessageId(format!("in-{}", uuid::Uuid::new_v4())),
        chat_id: ChatId(chat_id),
        chat_kind: ChatKind::Supergroup,
        chat_title: Some("Test group".into()),
        sender_id: Some(UserId(user_id)),
        sender_name: name.to_string(),
        text: Some(text.to_string()),
        timestamp,
    }
}
