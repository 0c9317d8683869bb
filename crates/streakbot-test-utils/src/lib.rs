// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Streakbot integration tests.
//!
//! Provides in-process doubles for the channel and storage adapters so the
//! agent can be exercised without Telegram or a database file.
//!
//! # Components
//!
//! - [`MockChannel`] - Mock messaging channel with message injection and capture
//! - [`MemoryStorage`] - Storage adapter backed by in-memory maps

pub mod memory_storage;
pub mod mock_channel;

pub use memory_storage::MemoryStorage;
pub use mock_channel::{MockChannel, inbound};
