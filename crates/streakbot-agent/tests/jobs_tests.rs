// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic jobs against the mock channel, the in-memory store, and SQLite.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use streakbot_agent::{AgentSettings, Dispatcher, JobKind, Jobs, RetryPolicy, ScheduledJob};
use streakbot_config::model::StorageConfig;
use streakbot_core::types::QuestTemplate;
use streakbot_core::{ChannelAdapter, ChatId, StorageAdapter};
use streakbot_cron::CronJob;
use streakbot_engine::LocalZone;
use streakbot_storage::SqliteStorage;
use streakbot_test_utils::{MemoryStorage, MockChannel, inbound};

fn settings() -> AgentSettings {
    AgentSettings {
        zone: LocalZone::from_hours(2).unwrap(),
        retry: RetryPolicy {
            max_attempts: 2,
            backoff: Duration::from_millis(1),
        },
        quotes: vec!["Sweat now, shine later.".into()],
        ..AgentSettings::default()
    }
}

fn at(d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, d, h, 0, 0).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
}

fn catalog() -> Vec<QuestTemplate> {
    vec![
        QuestTemplate::new("Go for a run", "run"),
        QuestTemplate::new("Take a walk", "walk"),
        QuestTemplate::new("Do 20 pushups", "pushups"),
    ]
}

async fn setup(chats: &[i64]) -> (Arc<MockChannel>, Arc<MemoryStorage>, Jobs) {
    let channel = Arc::new(MockChannel::new());
    let storage = Arc::new(MemoryStorage::new());
    storage.seed_quest_templates(&catalog()).await.unwrap();
    for chat in chats {
        storage.register_chat(ChatId(*chat), None).await.unwrap();
    }
    let jobs = Jobs::new(
        Arc::clone(&channel) as Arc<dyn ChannelAdapter>,
        Arc::clone(&storage) as Arc<dyn StorageAdapter>,
        settings(),
    );
    (channel, storage, jobs)
}

#[tokio::test]
async fn broadcast_announces_once_per_day() {
    let (channel, storage, jobs) = setup(&[-1, -2]).await;

    assert_eq!(jobs.broadcast_quests(at(1, 8)).await.unwrap(), 2);
    assert_eq!(channel.sent_count().await, 2);
    let first = storage.daily_quests(ChatId(-1), day(1)).await.unwrap();
    assert_eq!(first.len(), 1);

    assert_eq!(jobs.broadcast_quests(at(1, 9)).await.unwrap(), 0);
    assert_eq!(channel.sent_count().await, 2);
    assert_eq!(storage.daily_quests(ChatId(-1), day(1)).await.unwrap(), first);

    let sent = channel.sent_messages().await;
    assert!(sent[0].content.starts_with("📢 *Today's Quests:*"));
}

#[tokio::test]
async fn broadcast_avoids_yesterdays_tag() {
    let chats: Vec<i64> = (1..=30).map(|c| -c).collect();
    let (_channel, storage, jobs) = setup(&chats).await;
    for chat in &chats {
        storage
            .assign_daily_quests(ChatId(*chat), day(1), &[QuestTemplate::new("Go for a run", "run")])
            .await
            .unwrap();
    }

    jobs.broadcast_quests(at(2, 8)).await.unwrap();
    for chat in &chats {
        let today = storage.daily_quests(ChatId(*chat), day(2)).await.unwrap();
        assert_eq!(today.len(), 1);
        assert_ne!(today[0].tag, "run");
    }
}

#[tokio::test]
async fn broadcast_uses_local_date() {
    let (_channel, storage, jobs) = setup(&[-1]).await;
    // 23:00Z on June 1st is already June 2nd at UTC+2.
    jobs.broadcast_quests(at(1, 23)).await.unwrap();
    assert!(storage.daily_quests(ChatId(-1), day(1)).await.unwrap().is_empty());
    assert_eq!(storage.daily_quests(ChatId(-1), day(2)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn reminder_names_only_inactive_users() {
    let (channel, storage, jobs) = setup(&[-1]).await;
    let dispatcher = Dispatcher::new(
        Arc::clone(&channel) as Arc<dyn ChannelAdapter>,
        Arc::clone(&storage) as Arc<dyn StorageAdapter>,
        settings(),
    );
    dispatcher
        .handle(&inbound(-1, 1, "Ann", "+", at(1, 7)))
        .await
        .unwrap();
    dispatcher
        .handle(&inbound(-1, 2, "Bo", "hello", at(1, 7)))
        .await
        .unwrap();
    channel.clear_sent().await;

    assert_eq!(jobs.send_reminders(at(1, 19)).await.unwrap(), 1);
    let sent = channel.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].content.starts_with("Sweat now, shine later\\."));
    assert!(sent[0].content.contains("[Bo](tg://user?id=2)"));
    assert!(!sent[0].content.contains("tg://user?id=1"));
}

#[tokio::test]
async fn reminder_is_silent_when_everyone_is_active() {
    let (channel, storage, jobs) = setup(&[-1]).await;
    let dispatcher = Dispatcher::new(
        Arc::clone(&channel) as Arc<dyn ChannelAdapter>,
        Arc::clone(&storage) as Arc<dyn StorageAdapter>,
        settings(),
    );
    dispatcher
        .handle(&inbound(-1, 1, "Ann", "+", at(1, 7)))
        .await
        .unwrap();

    assert_eq!(jobs.send_reminders(at(1, 19)).await.unwrap(), 0);
    assert_eq!(channel.sent_count().await, 0);
}

#[tokio::test]
async fn scheduled_rollover_uses_local_year() {
    let (_channel, storage, jobs) = setup(&[-1]).await;
    let dispatcher = Dispatcher::new(
        Arc::new(MockChannel::new()) as Arc<dyn ChannelAdapter>,
        Arc::clone(&storage) as Arc<dyn StorageAdapter>,
        settings(),
    );
    dispatcher
        .handle(&inbound(-1, 1, "Ann", "+", at(1, 7)))
        .await
        .unwrap();

    // 21:55Z on Dec 31st is 23:55 local, still 2026.
    let job = ScheduledJob::new(JobKind::Rollover, jobs);
    job.run(Utc.with_ymd_and_hms(2026, 12, 31, 21, 55, 0).unwrap())
        .await
        .unwrap();

    let archived = storage.archived_streaks(ChatId(-1), 2026).await.unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].streak, 1);
    assert_eq!(storage.list_streaks(ChatId(-1)).await.unwrap()[0].streak, 0);
}

#[tokio::test]
async fn rollover_twice_against_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(SqliteStorage::new(StorageConfig {
        database_path: dir.path().join("bot.db").to_string_lossy().into_owned(),
        wal_mode: true,
    }));
    storage.initialize().await.unwrap();

    let channel = Arc::new(MockChannel::new());
    let dispatcher = Dispatcher::new(
        Arc::clone(&channel) as Arc<dyn ChannelAdapter>,
        Arc::clone(&storage) as Arc<dyn StorageAdapter>,
        settings(),
    );
    for (user, name) in [(1, "Ann"), (2, "Bo")] {
        dispatcher
            .handle(&inbound(-1, user, name, "+", at(1, 7)))
            .await
            .unwrap();
    }

    let jobs = Jobs::new(
        Arc::clone(&channel) as Arc<dyn ChannelAdapter>,
        Arc::clone(&storage) as Arc<dyn StorageAdapter>,
        settings(),
    );
    let first = jobs.rollover(2026).await.unwrap();
    assert_eq!(first.streaks_archived, 2);
    let second = jobs.rollover(2026).await.unwrap();
    assert_eq!(second.streaks_archived, 0);
    assert_eq!(second.streaks_reset, 0);

    assert_eq!(storage.archived_streaks(ChatId(-1), 2026).await.unwrap().len(), 2);
    for record in storage.list_streaks(ChatId(-1)).await.unwrap() {
        assert_eq!(record.streak, 0);
    }
}

#[tokio::test]
async fn sqlite_dispatch_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(SqliteStorage::new(StorageConfig {
        database_path: dir.path().join("bot.db").to_string_lossy().into_owned(),
        wal_mode: true,
    }));
    storage.initialize().await.unwrap();
    storage.seed_quest_templates(&catalog()).await.unwrap();
    storage.register_chat(ChatId(-1), Some("Gym")).await.unwrap();

    let channel = Arc::new(MockChannel::new());
    let jobs = Jobs::new(
        Arc::clone(&channel) as Arc<dyn ChannelAdapter>,
        Arc::clone(&storage) as Arc<dyn StorageAdapter>,
        settings(),
    );
    jobs.broadcast_quests(at(1, 8)).await.unwrap();
    let tag = storage.daily_quests(ChatId(-1), day(1)).await.unwrap()[0]
        .tag
        .clone();

    let dispatcher = Dispatcher::new(
        Arc::clone(&channel) as Arc<dyn ChannelAdapter>,
        Arc::clone(&storage) as Arc<dyn StorageAdapter>,
        settings(),
    );
    let text = format!("done #{tag}");
    let first = dispatcher.handle(&inbound(-1, 1, "Ann", &text, at(1, 9))).await.unwrap();
    assert!(first.completion_recorded);
    let second = dispatcher.handle(&inbound(-1, 1, "Ann", &text, at(1, 10))).await.unwrap();
    assert!(!second.completion_recorded);

    let scores = storage.quest_scores(ChatId(-1)).await.unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].completions, 1);
}
