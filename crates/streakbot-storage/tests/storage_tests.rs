// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the SQLite gateway: concurrent streak updates and
//! the yearly rollover.

use std::sync::Arc;

use chrono::NaiveDate;
use streakbot_config::model::StorageConfig;
use streakbot_core::StorageAdapter;
use streakbot_core::types::{ChatId, QuestCompletion, UserId};
use streakbot_engine::{StreakEvent, StreakPolicy, streak_mutation};
use streakbot_storage::SqliteStorage;

async fn open(dir: &tempfile::TempDir) -> SqliteStorage {
    let storage = SqliteStorage::new(StorageConfig {
        database_path: dir.path().join("streakbot.db").to_string_lossy().into_owned(),
        wal_mode: true,
    });
    storage.initialize().await.expect("initialize");
    storage
}

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, m, d).unwrap()
}

fn event(user: i64, name: &str, on: NaiveDate) -> StreakEvent {
    StreakEvent {
        chat_id: ChatId(-100),
        user_id: UserId(user),
        display_name: name.into(),
        date: on,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_markers_accept_exactly_two() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(open(&dir).await);
    storage
        .ensure_streak_record(ChatId(-100), UserId(7), "Ann")
        .await
        .unwrap();

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let storage = Arc::clone(&storage);
            tokio::spawn(async move {
                storage
                    .update_streak(
                        ChatId(-100),
                        UserId(7),
                        "Ann",
                        streak_mutation(StreakPolicy::default(), event(7, "Ann", date(6, 1))),
                    )
                    .await
                    .unwrap()
                    .accepted
            })
        })
        .collect();

    let accepted = futures::future::join_all(tasks)
        .await
        .into_iter()
        .filter(|r| *r.as_ref().unwrap())
        .count();
    assert_eq!(accepted, 2);

    let records = storage.list_streaks(ChatId(-100)).await.unwrap();
    assert_eq!(records[0].streak, 2);
    assert_eq!(records[0].daily_count, 2);
}

#[tokio::test]
async fn new_day_after_cap_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let storage = open(&dir).await;
    let policy = StreakPolicy::default();

    for _ in 0..3 {
        storage
            .update_streak(
                ChatId(-100),
                UserId(7),
                "Ann",
                streak_mutation(policy, event(7, "Ann", date(6, 1))),
            )
            .await
            .unwrap();
    }
    let next = storage
        .update_streak(
            ChatId(-100),
            UserId(7),
            "Ann",
            streak_mutation(policy, event(7, "Ann", date(6, 2))),
        )
        .await
        .unwrap();
    assert!(next.accepted);
    assert_eq!(next.record.streak, 3);
    assert_eq!(next.record.daily_count, 1);
}

#[tokio::test]
async fn rollover_twice_keeps_one_archive_row() {
    let dir = tempfile::tempdir().unwrap();
    let storage = open(&dir).await;
    let policy = StreakPolicy::default();

    for (user, name, days) in [(1, "Ann", 3u32), (2, "Bo", 1)] {
        for d in 1..=days {
            storage
                .update_streak(
                    ChatId(-100),
                    UserId(user),
                    name,
                    streak_mutation(policy, event(user, name, date(12, d))),
                )
                .await
                .unwrap();
        }
    }
    for tag in ["run", "walk"] {
        storage
            .insert_completion(&QuestCompletion {
                chat_id: ChatId(-100),
                user_id: UserId(1),
                display_name: "Ann".into(),
                tag: tag.into(),
                date: date(12, 3),
            })
            .await
            .unwrap();
    }

    let first = storage.archive_and_reset(2026).await.unwrap();
    assert_eq!(first.streaks_archived, 2);
    assert_eq!(first.quest_tallies_archived, 1);
    assert_eq!(first.streaks_reset, 2);
    assert_eq!(first.completions_cleared, 2);

    let second = storage.archive_and_reset(2026).await.unwrap();
    assert_eq!(second.streaks_archived, 0);
    assert_eq!(second.quest_tallies_archived, 0);
    assert_eq!(second.streaks_reset, 0);
    assert_eq!(second.completions_cleared, 0);

    let archived = storage.archived_streaks(ChatId(-100), 2026).await.unwrap();
    let values: Vec<_> = archived
        .iter()
        .map(|e| (e.display_name.as_str(), e.streak))
        .collect();
    assert_eq!(values, vec![("Ann", 3), ("Bo", 1)]);

    let tallies = storage
        .archived_quest_scores(ChatId(-100), 2026)
        .await
        .unwrap();
    assert_eq!(tallies.len(), 1);
    assert_eq!(tallies[0].completions, 2);

    for record in storage.list_streaks(ChatId(-100)).await.unwrap() {
        assert_eq!(record.streak, 0);
        assert_eq!(record.daily_count, 0);
        assert!(record.last_activity.is_none());
    }
    assert!(storage.quest_scores(ChatId(-100)).await.unwrap().is_empty());
}

#[tokio::test]
async fn archives_are_scoped_by_year_and_chat() {
    let dir = tempfile::tempdir().unwrap();
    let storage = open(&dir).await;
    storage
        .update_streak(
            ChatId(-100),
            UserId(1),
            "Ann",
            streak_mutation(StreakPolicy::default(), event(1, "Ann", date(1, 5))),
        )
        .await
        .unwrap();
    storage.archive_and_reset(2025).await.unwrap();

    assert_eq!(storage.archived_streaks(ChatId(-100), 2025).await.unwrap().len(), 1);
    assert!(storage.archived_streaks(ChatId(-100), 2024).await.unwrap().is_empty());
    assert!(storage.archived_streaks(ChatId(-5), 2025).await.unwrap().is_empty());
}

#[tokio::test]
async fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let storage = open(&dir).await;
        storage.register_chat(ChatId(-100), Some("Gym")).await.unwrap();
        storage.close().await.unwrap();
    }
    let storage = open(&dir).await;
    let chats = storage.list_chats().await.unwrap();
    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0].title.as_deref(), Some("Gym"));
}
