// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Streakbot.

use thiserror::Error;

/// The primary error type used across all Streakbot adapter traits and core operations.
#[derive(Debug, Error)]
pub enum StreakbotError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (connection failure, rejected send, bad chat id).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The channel will not deliver any more inbound messages.
    #[error("channel closed")]
    ChannelClosed,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Inbound data that cannot be processed (no sender, unparsable id).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StreakbotError {
    /// Whether retrying the same operation may succeed.
    ///
    /// Store round-trips and timeouts are transient; everything else is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Timeout { .. })
    }

    /// Shorthand for a storage error carrying a plain message.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            source: message.into().into(),
        }
    }
}
