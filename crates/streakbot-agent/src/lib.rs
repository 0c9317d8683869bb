// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message handling and periodic jobs for Streakbot.
//!
//! The [`StreakAgent`] is the central coordinator that:
//! - Runs a pool of workers pulling inbound messages from the channel
//! - Hands each message to the [`Dispatcher`] (commands, streaks, quests)
//! - Stops taking messages when the shutdown token fires, then closes storage
//!
//! The periodic jobs in [`jobs`] share the same channel and storage and are
//! driven by the cron scheduler.

pub mod dispatcher;
pub mod jobs;
pub mod recording;
pub mod retry;
pub mod settings;
pub mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use streakbot_core::{ChannelAdapter, StorageAdapter, StreakbotError};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use dispatcher::{DispatchReport, Dispatcher};
pub use jobs::{JobKind, Jobs, ScheduledJob};
pub use retry::{RetryPolicy, with_retry};
pub use settings::AgentSettings;

/// Pause after a receive error before asking the channel again.
const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_millis(500);

/// The worker pool that feeds inbound messages to the dispatcher.
pub struct StreakAgent {
    channel: Arc<dyn ChannelAdapter>,
    storage: Arc<dyn StorageAdapter>,
    dispatcher: Arc<Dispatcher>,
    workers: usize,
}

impl StreakAgent {
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        storage: Arc<dyn StorageAdapter>,
        settings: AgentSettings,
    ) -> Self {
        let workers = settings.workers.max(1);
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&channel),
            Arc::clone(&storage),
            settings,
        ));
        info!(workers, "streak agent initialized");
        Self {
            channel,
            storage,
            dispatcher,
            workers,
        }
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Run the workers until `cancel` fires or the channel closes, then
    /// close storage.
    ///
    /// A message already taken by a worker is handled to completion before
    /// that worker stops.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), StreakbotError> {
        info!(workers = self.workers, "streak agent running");

        let mut tasks = JoinSet::new();
        for worker in 0..self.workers {
            tasks.spawn(worker_loop(
                worker,
                Arc::clone(&self.channel),
                Arc::clone(&self.dispatcher),
                cancel.clone(),
            ));
        }
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "worker task panicked");
            }
        }

        self.storage.close().await?;
        info!("streak agent stopped");
        Ok(())
    }
}

async fn worker_loop(
    worker: usize,
    channel: Arc<dyn ChannelAdapter>,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
) {
    debug!(worker, "worker started");
    loop {
        let inbound = tokio::select! {
            msg = channel.receive() => msg,
            _ = cancel.cancelled() => break,
        };
        match inbound {
            Ok(msg) => {
                recording::record_message();
                match dispatcher.handle(&msg).await {
                    Ok(report) => debug!(worker, chat_id = %msg.chat_id, ?report, "message handled"),
                    Err(e) => {
                        recording::record_dropped_message();
                        warn!(worker, chat_id = %msg.chat_id, error = %e, "message dropped after store failure");
                    }
                }
            }
            Err(StreakbotError::ChannelClosed) => {
                info!(worker, "channel closed");
                break;
            }
            Err(e) => {
                error!(worker, error = %e, "channel receive error");
                tokio::select! {
                    _ = tokio::time::sleep(RECEIVE_ERROR_BACKOFF) => {}
                    _ = cancel.cancelled() => break,
                }
            }
        }
    }
    debug!(worker, "worker stopped");
}
