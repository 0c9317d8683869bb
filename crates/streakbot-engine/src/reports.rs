// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message text for command replies and bot notices, in MarkdownV2.

use std::fmt::Write;

use streakbot_core::types::{DailyQuest, QuestScore, StreakArchiveEntry, StreakRecord};

use crate::markdown::{bold, escape, mention};

/// `/streaks`: every user's current streak.
pub fn current_streaks(records: &[StreakRecord]) -> String {
    if records.is_empty() {
        return escape("No streaks found.");
    }
    let mut out = format!("🔥 {}\n", bold("Current Streaks:"));
    for r in records {
        let _ = writeln!(out, "{}: {}", escape(&r.display_name), r.streak);
    }
    out
}

/// `/streaks <year>`: the snapshot archived at the end of `year`.
pub fn archived_streaks(year: i32, entries: &[StreakArchiveEntry]) -> String {
    if entries.is_empty() {
        return escape(&format!("No archived streaks for {year}."));
    }
    let mut out = format!("🔥 {}\n", bold(&format!("Streaks of {year}:")));
    for e in entries {
        let _ = writeln!(out, "{}: {}", escape(&e.display_name), e.streak);
    }
    out
}

/// `/quest`: today's assignment.
pub fn todays_quests(quests: &[DailyQuest]) -> String {
    if quests.is_empty() {
        return escape("No quests announced yet.");
    }
    let mut out = format!("📢 {}\n", bold("Today's Quests:"));
    for q in quests {
        let _ = writeln!(out, "\\- {}  \\#{}", escape(&q.description), escape(&q.tag));
    }
    out
}

/// `/questscore`: the current leaderboard.
pub fn quest_leaderboard(scores: &[QuestScore]) -> String {
    if scores.is_empty() {
        return escape("No completed quests yet.");
    }
    leaderboard(&bold("Quest Leaderboard:"), scores)
}

/// `/questscore <year>`: the leaderboard archived at the end of `year`.
pub fn archived_leaderboard(year: i32, scores: &[QuestScore]) -> String {
    if scores.is_empty() {
        return escape(&format!("No archived quest scores for {year}."));
    }
    leaderboard(&bold(&format!("Quest Leaderboard {year}:")), scores)
}

fn leaderboard(title: &str, scores: &[QuestScore]) -> String {
    let mut out = format!("🏆 {title}\n");
    for s in scores {
        let _ = writeln!(out, "{}: {}", escape(&s.display_name), s.completions);
    }
    out
}

/// `/help`.
pub fn help(cutoff_hour: u32) -> String {
    let lines = [
        "Post + (or ++) once a day to keep your streak going. Up to two count per day.".to_string(),
        format!("Complete a quest by posting its hashtag before {cutoff_hour:02}:00."),
        String::new(),
        "/streaks [year] - current or archived streaks".to_string(),
        "/quest - today's quests".to_string(),
        "/questscore [year] - quest leaderboard".to_string(),
    ];
    format!("{}\n{}", bold("Streakbot"), escape(&lines.join("\n")))
}

/// The daily quest broadcast.
pub fn quest_announcement(quests: &[DailyQuest], cutoff_hour: u32) -> String {
    let mut out = todays_quests(quests);
    let _ = write!(
        out,
        "{}",
        escape(&format!("Post the hashtag before {cutoff_hour:02}:00 to complete it."))
    );
    out
}

/// The evening nudge for users without activity today.
pub fn inactivity_reminder(quote: &str, inactive: &[StreakRecord]) -> String {
    let mentions: Vec<String> = inactive
        .iter()
        .map(|r| mention(r.user_id, &r.display_name))
        .collect();
    format!(
        "{}\n\n{}\n{}",
        escape(quote),
        escape("These champions haven't hit their streak today:"),
        mentions.join("\n")
    )
}

/// Confirmation after a quest completion is recorded.
pub fn quest_completed(display_name: &str, quest: &DailyQuest) -> String {
    format!(
        "✅ {} completed {} \\#{}",
        bold(display_name),
        escape(&quest.description),
        escape(&quest.tag)
    )
}

/// Reply to a completion attempt at or after the cutoff.
pub fn cutoff_notice(cutoff_hour: u32, utc_offset_hours: i32) -> String {
    escape(&format!(
        "⏰ Sorry, quest completions are only accepted before {cutoff_hour:02}:00 (UTC{utc_offset_hours:+03}:00)."
    ))
}
