// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatcher behavior against the mock channel and the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use streakbot_agent::{AgentSettings, Dispatcher, RetryPolicy, StreakAgent};
use streakbot_core::types::{ChatKind, ParseMode, QuestTemplate};
use streakbot_core::{ChannelAdapter, ChatId, StorageAdapter, StreakbotError, UserId};
use streakbot_engine::{Command, LocalZone, QuestOutcome};
use streakbot_test_utils::{MemoryStorage, MockChannel, inbound};
use tokio_util::sync::CancellationToken;

const CHAT: i64 = -1001;

struct Harness {
    channel: Arc<MockChannel>,
    storage: Arc<MemoryStorage>,
    dispatcher: Dispatcher,
}

fn settings() -> AgentSettings {
    AgentSettings {
        zone: LocalZone::from_hours(2).unwrap(),
        retry: RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(1),
        },
        ..AgentSettings::default()
    }
}

fn harness() -> Harness {
    let channel = Arc::new(MockChannel::new());
    let storage = Arc::new(MemoryStorage::new());
    let dispatcher = Dispatcher::new(
        Arc::clone(&channel) as Arc<dyn ChannelAdapter>,
        Arc::clone(&storage) as Arc<dyn StorageAdapter>,
        settings(),
    );
    Harness {
        channel,
        storage,
        dispatcher,
    }
}

/// 2026-06-01 at `h:m` local (UTC+2).
fn local(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, h - 2, m, 0).unwrap()
}

fn june_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
}

async fn assign(storage: &MemoryStorage, tags: &[&str]) {
    let templates: Vec<_> = tags
        .iter()
        .map(|t| QuestTemplate::new(format!("Do some {t}"), *t))
        .collect();
    storage
        .assign_daily_quests(ChatId(CHAT), june_first(), &templates)
        .await
        .unwrap();
}

#[tokio::test]
async fn morning_streak_scenario() {
    let h = harness();
    let first = h
        .dispatcher
        .handle(&inbound(CHAT, 7, "Ann", "+", local(9, 0)))
        .await
        .unwrap();
    assert_eq!(first.streak_accepted, Some(true));

    let second = h
        .dispatcher
        .handle(&inbound(CHAT, 7, "Ann", "++", local(9, 5)))
        .await
        .unwrap();
    assert_eq!(second.streak_accepted, Some(true));

    let third = h
        .dispatcher
        .handle(&inbound(CHAT, 7, "Ann", "+", local(9, 10)))
        .await
        .unwrap();
    assert_eq!(third.streak_accepted, Some(false));

    let records = h.storage.list_streaks(ChatId(CHAT)).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].streak, 2);
    assert_eq!(records[0].daily_count, 2);
    assert_eq!(records[0].last_activity, Some(june_first()));
    assert_eq!(h.channel.reactions().await.len(), 2);
}

#[tokio::test]
async fn plain_chatter_registers_without_activity() {
    let h = harness();
    let report = h
        .dispatcher
        .handle(&inbound(CHAT, 7, "Ann", "good morning", local(8, 0)))
        .await
        .unwrap();
    assert_eq!(report.streak_accepted, None);
    assert_eq!(report.quest, None);

    let records = h.storage.list_streaks(ChatId(CHAT)).await.unwrap();
    assert_eq!(records[0].streak, 0);
    assert!(records[0].last_activity.is_none());
    assert_eq!(h.storage.list_chats().await.unwrap().len(), 1);
    assert!(h.channel.reactions().await.is_empty());
}

#[tokio::test]
async fn private_chats_are_not_registered() {
    let h = harness();
    let mut msg = inbound(42, 42, "Ann", "+", local(9, 0));
    msg.chat_kind = ChatKind::Private;
    h.dispatcher.handle(&msg).await.unwrap();
    assert!(h.storage.list_chats().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_text_and_missing_sender_are_skipped() {
    let h = harness();
    let mut blank = inbound(CHAT, 7, "Ann", "   ", local(9, 0));
    assert!(h.dispatcher.handle(&blank).await.unwrap().skipped);
    blank.text = None;
    assert!(h.dispatcher.handle(&blank).await.unwrap().skipped);

    let mut anonymous = inbound(CHAT, 7, "Ann", "+", local(9, 0));
    anonymous.sender_id = None;
    assert!(h.dispatcher.handle(&anonymous).await.unwrap().skipped);

    assert!(h.storage.list_streaks(ChatId(CHAT)).await.unwrap().is_empty());
    assert!(h.storage.list_chats().await.unwrap().is_empty());
}

#[tokio::test]
async fn quest_completion_then_resend() {
    let h = harness();
    assign(&h.storage, &["run"]).await;

    let msg = inbound(CHAT, 7, "Ann", "did my #run today", local(9, 0));
    let report = h.dispatcher.handle(&msg).await.unwrap();
    assert!(report.completion_recorded);
    assert!(matches!(report.quest, Some(QuestOutcome::Completed(ref q)) if q.tag == "run"));

    let sent = h.channel.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].reply_to, Some(msg.id.clone()));
    assert_eq!(sent[0].parse_mode, ParseMode::MarkdownV2);
    assert!(sent[0].content.contains("\\#run"));
    assert_eq!(h.channel.reactions().await.len(), 1);

    let again = h
        .dispatcher
        .handle(&inbound(CHAT, 7, "Ann", "#run again!", local(9, 30)))
        .await
        .unwrap();
    assert_eq!(again.quest, Some(QuestOutcome::AlreadyCompleted("run".into())));
    assert!(!again.completion_recorded);
    assert_eq!(h.storage.completions().await.len(), 1);
    assert_eq!(h.channel.sent_count().await, 1);
}

#[tokio::test]
async fn completion_after_cutoff_gets_notice() {
    let h = harness();
    assign(&h.storage, &["run"]).await;

    let report = h
        .dispatcher
        .handle(&inbound(CHAT, 7, "Ann", "#run", local(22, 15)))
        .await
        .unwrap();
    assert!(matches!(report.quest, Some(QuestOutcome::TooLate(_))));
    assert!(h.storage.completions().await.is_empty());

    let sent = h.channel.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].content.contains("22:00"));
    assert!(sent[0].content.contains("UTC\\+02:00"));
}

#[tokio::test]
async fn marker_and_hashtag_in_one_message() {
    let h = harness();
    assign(&h.storage, &["run"]).await;

    let report = h
        .dispatcher
        .handle(&inbound(CHAT, 7, "Ann", "+ #run", local(9, 0)))
        .await
        .unwrap();
    assert_eq!(report.streak_accepted, Some(true));
    assert!(report.completion_recorded);
    assert_eq!(h.channel.reactions().await.len(), 1);
}

#[tokio::test]
async fn hashtag_without_assignment_is_no_match() {
    let h = harness();
    let report = h
        .dispatcher
        .handle(&inbound(CHAT, 7, "Ann", "#run", local(9, 0)))
        .await
        .unwrap();
    assert_eq!(report.quest, Some(QuestOutcome::NoMatch));
    assert_eq!(h.channel.sent_count().await, 0);
}

#[tokio::test]
async fn commands_reply_without_mutating() {
    let h = harness();
    let report = h
        .dispatcher
        .handle(&inbound(CHAT, 7, "Ann", "/streaks@streakbot", local(9, 0)))
        .await
        .unwrap();
    assert_eq!(report.command, Some(Command::Streaks(None)));
    assert!(h.storage.list_streaks(ChatId(CHAT)).await.unwrap().is_empty());
    assert!(h.storage.list_chats().await.unwrap().is_empty());

    let sent = h.channel.sent_messages().await;
    assert_eq!(sent[0].content, "No streaks found\\.");
}

#[tokio::test]
async fn streaks_command_lists_users() {
    let h = harness();
    h.dispatcher
        .handle(&inbound(CHAT, 1, "Ann", "+", local(9, 0)))
        .await
        .unwrap();
    h.dispatcher
        .handle(&inbound(CHAT, 2, "Bo", "hello", local(9, 0)))
        .await
        .unwrap();
    h.dispatcher
        .handle(&inbound(CHAT, 2, "Bo", "/streaks", local(9, 1)))
        .await
        .unwrap();

    let sent = h.channel.sent_messages().await;
    assert_eq!(sent.last().unwrap().content, "🔥 *Current Streaks:*\nAnn: 1\nBo: 0\n");
}

#[tokio::test]
async fn year_commands_read_the_archive() {
    let h = harness();
    h.dispatcher
        .handle(&inbound(CHAT, 1, "Ann", "+", local(9, 0)))
        .await
        .unwrap();
    h.storage.archive_and_reset(2026).await.unwrap();

    h.dispatcher
        .handle(&inbound(CHAT, 1, "Ann", "/streaks 2026", local(9, 1)))
        .await
        .unwrap();
    h.dispatcher
        .handle(&inbound(CHAT, 1, "Ann", "/questscore 2025", local(9, 2)))
        .await
        .unwrap();

    let sent = h.channel.sent_messages().await;
    assert!(sent[0].content.contains("Streaks of 2026"));
    assert!(sent[0].content.contains("Ann: 1"));
    assert_eq!(sent[1].content, "No archived quest scores for 2025\\.");
}

#[tokio::test]
async fn unknown_commands_are_ignored() {
    let h = harness();
    let report = h
        .dispatcher
        .handle(&inbound(CHAT, 7, "Ann", "/dance ++", local(9, 0)))
        .await
        .unwrap();
    assert_eq!(report.command, Some(Command::Unknown("dance".into())));
    assert_eq!(report.streak_accepted, None);
    assert_eq!(h.channel.sent_count().await, 0);
}

#[tokio::test]
async fn transient_store_failures_are_retried() {
    let h = harness();
    h.storage.fail_next_updates(2);
    let report = h
        .dispatcher
        .handle(&inbound(CHAT, 7, "Ann", "+", local(9, 0)))
        .await
        .unwrap();
    assert_eq!(report.streak_accepted, Some(true));
    let records = h.storage.list_streaks(ChatId(CHAT)).await.unwrap();
    assert_eq!(records[0].streak, 1);
}

#[tokio::test]
async fn exhausted_retries_drop_the_message() {
    let h = harness();
    h.storage.fail_next_updates(3);
    let result = h
        .dispatcher
        .handle(&inbound(CHAT, 7, "Ann", "+", local(9, 0)))
        .await;
    assert!(result.is_err());
    let records = h.storage.list_streaks(ChatId(CHAT)).await.unwrap();
    assert_eq!(records[0].streak, 0);
    assert!(h.channel.reactions().await.is_empty());
}

#[tokio::test]
async fn send_failures_do_not_fail_the_message() {
    let h = harness();
    assign(&h.storage, &["run"]).await;
    h.channel.fail_next_sends(1);
    let report = h
        .dispatcher
        .handle(&inbound(CHAT, 7, "Ann", "#run", local(9, 0)))
        .await
        .unwrap();
    assert!(report.completion_recorded);
    assert_eq!(h.storage.completions().await.len(), 1);
}

#[tokio::test]
async fn display_name_follows_latest_message() {
    let h = harness();
    h.dispatcher
        .handle(&inbound(CHAT, 7, "Ann", "+", local(9, 0)))
        .await
        .unwrap();
    h.dispatcher
        .handle(&inbound(CHAT, 7, "Annie", "hi", local(9, 5)))
        .await
        .unwrap();
    let records = h.storage.list_streaks(ChatId(CHAT)).await.unwrap();
    assert_eq!(records[0].display_name, "Annie");
    assert_eq!(records[0].user_id, UserId(7));
}

#[tokio::test]
async fn worker_pool_processes_injected_messages() {
    let channel = Arc::new(MockChannel::new());
    let storage = Arc::new(MemoryStorage::new());
    let agent = StreakAgent::new(
        Arc::clone(&channel) as Arc<dyn ChannelAdapter>,
        Arc::clone(&storage) as Arc<dyn StorageAdapter>,
        settings(),
    );

    for user in 1..=5 {
        channel
            .inject_message(inbound(CHAT, user, &format!("user{user}"), "+", local(9, 0)))
            .await;
    }

    let cancel = CancellationToken::new();
    let run = tokio::spawn(agent.run(cancel.clone()));

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let records = storage.list_streaks(ChatId(CHAT)).await.unwrap();
            if records.len() == 5 && records.iter().all(|r| r.streak == 1) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("workers did not process all messages");

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("agent did not stop")
        .unwrap()
        .unwrap();
    assert_eq!(channel.reactions().await.len(), 5);
}

#[tokio::test]
async fn workers_survive_receive_errors_and_stop_when_channel_closes() {
    let channel = Arc::new(MockChannel::new());
    let storage = Arc::new(MemoryStorage::new());
    let agent = StreakAgent::new(
        Arc::clone(&channel) as Arc<dyn ChannelAdapter>,
        Arc::clone(&storage) as Arc<dyn StorageAdapter>,
        AgentSettings {
            workers: 1,
            ..settings()
        },
    );

    channel
        .inject_receive_error(StreakbotError::Channel {
            message: "polling interrupted".into(),
            source: None,
        })
        .await;
    channel
        .inject_message(inbound(CHAT, 1, "Ann", "+", local(9, 0)))
        .await;

    let run = tokio::spawn(agent.run(CancellationToken::new()));

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let records = storage.list_streaks(ChatId(CHAT)).await.unwrap();
            if records.first().is_some_and(|r| r.streak == 1) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("worker did not recover from the receive error");

    channel.close();
    tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("agent did not stop after the channel closed")
        .unwrap()
        .unwrap();
}
