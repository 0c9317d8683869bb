// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs registered jobs at their cron occurrences until cancelled.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use streakbot_core::StreakbotError;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::schedule::CronSchedule;

/// A unit of periodic work.
#[async_trait]
pub trait CronJob: Send + Sync {
    /// Run once. `fired_at` is the scheduled occurrence, not the wall clock.
    async fn run(&self, fired_at: DateTime<Utc>) -> Result<(), StreakbotError>;
}

/// Holds the (schedule, job) pairs and drives them.
#[derive(Default)]
pub struct CronScheduler {
    entries: Vec<(CronSchedule, Arc<dyn CronJob>)>,
}

impl CronScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job.
    pub fn add(&mut self, schedule: CronSchedule, job: Arc<dyn CronJob>) {
        info!(
            job = schedule.name(),
            cron = schedule.expression(),
            "cron job registered"
        );
        self.entries.push((schedule, job));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every job on its own task until `cancel` fires.
    ///
    /// Job errors are logged and the job keeps its schedule. Returns once all
    /// job tasks have stopped.
    pub async fn run(self, cancel: CancellationToken) {
        let mut tasks = JoinSet::new();
        for (schedule, job) in self.entries {
            tasks.spawn(run_entry(schedule, job, cancel.clone()));
        }
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "cron task panicked");
            }
        }
        info!("cron scheduler stopped");
    }
}

async fn run_entry(schedule: CronSchedule, job: Arc<dyn CronJob>, cancel: CancellationToken) {
    let mut after = Utc::now();
    loop {
        let next = match schedule.next_after(after) {
            Ok(next) => next,
            Err(e) => {
                error!(job = schedule.name(), error = %e, "cron job has no next occurrence, stopping it");
                return;
            }
        };
        let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        debug!(job = schedule.name(), next = %next, wait_secs = wait.as_secs(), "cron job sleeping");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = cancel.cancelled() => {
                debug!(job = schedule.name(), "cron job cancelled");
                return;
            }
        }

        info!(job = schedule.name(), scheduled = %next, "cron job firing");
        if let Err(e) = job.run(next).await {
            warn!(job = schedule.name(), error = %e, "cron job failed");
        }
        // Occurrences missed while the job ran are skipped, not replayed.
        after = next.max(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(AtomicUsize);

    #[async_trait]
    impl CronJob for Counting {
        async fn run(&self, _fired_at: DateTime<Utc>) -> Result<(), StreakbotError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn yearly() -> CronSchedule {
        CronSchedule::parse("rollover", "55 23 31 12 *", FixedOffset::east_opt(0).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn cancellation_stops_the_scheduler() {
        let job = Arc::new(Counting(AtomicUsize::new(0)));
        let mut scheduler = CronScheduler::new();
        scheduler.add(yearly(), job.clone());
        assert_eq!(scheduler.len(), 1);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(scheduler.run(cancel.clone()));
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
        assert_eq!(job.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_scheduler_returns_immediately() {
        let scheduler = CronScheduler::new();
        assert!(scheduler.is_empty());
        tokio::time::timeout(Duration::from_secs(1), scheduler.run(CancellationToken::new()))
            .await
            .expect("empty scheduler should return");
    }
}
