// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Yearly archive and reset.

use rusqlite::{TransactionBehavior, params};
use streakbot_core::StreakbotError;
use streakbot_core::types::{ChatId, QuestScore, RolloverSummary, StreakArchiveEntry, UserId};

use crate::database::Database;

/// Archived streaks of a chat for `year`, highest first.
pub async fn archived_streaks(
    db: &Database,
    chat_id: ChatId,
    year: i32,
) -> Result<Vec<StreakArchiveEntry>, StreakbotError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT chat_id, user_id, display_name, streak, year FROM streaks_archive
                 WHERE chat_id = ?1 AND year = ?2
                 ORDER BY streak DESC, display_name COLLATE NOCASE ASC",
            )?;
            let rows = stmt.query_map(params![chat_id.0, year], |row| {
                Ok(StreakArchiveEntry {
                    chat_id: ChatId(row.get(0)?),
                    user_id: UserId(row.get(1)?),
                    display_name: row.get(2)?,
                    streak: row.get(3)?,
                    year: row.get(4)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Archived quest tallies of a chat for `year`, most first.
pub async fn archived_quest_scores(
    db: &Database,
    chat_id: ChatId,
    year: i32,
) -> Result<Vec<QuestScore>, StreakbotError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, display_name, completions FROM quest_completions_archive
                 WHERE chat_id = ?1 AND year = ?2
                 ORDER BY completions DESC, display_name COLLATE NOCASE ASC",
            )?;
            let rows = stmt.query_map(params![chat_id.0, year], |row| {
                Ok(QuestScore {
                    user_id: UserId(row.get(0)?),
                    display_name: row.get(1)?,
                    completions: row.get(2)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Archive every streak and quest tally under `year`, then reset the cycle.
///
/// Runs as one immediate transaction. Archive inserts ignore keys that are
/// already present, so a second run for the same year keeps the first
/// snapshot and only re-applies the (already done) reset.
pub async fn archive_and_reset(db: &Database, year: i32) -> Result<RolloverSummary, StreakbotError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let streaks_archived = tx.execute(
                "INSERT OR IGNORE INTO streaks_archive (chat_id, user_id, display_name, streak, year)
                 SELECT chat_id, user_id, display_name, streak, ?1 FROM streaks",
                params![year],
            )?;

            let quest_tallies_archived = tx.execute(
                "INSERT OR IGNORE INTO quest_completions_archive
                     (chat_id, user_id, display_name, completions, year)
                 SELECT c.chat_id, c.user_id,
                        (SELECT l.display_name FROM quest_completions l
                          WHERE l.chat_id = c.chat_id AND l.user_id = c.user_id
                          ORDER BY l.id DESC LIMIT 1),
                        COUNT(*), ?1
                 FROM quest_completions c
                 GROUP BY c.chat_id, c.user_id",
                params![year],
            )?;

            let streaks_reset = tx.execute(
                "UPDATE streaks SET streak = 0, daily_count = 0, last_activity = NULL
                 WHERE streak <> 0 OR daily_count <> 0 OR last_activity IS NOT NULL",
                [],
            )?;

            let completions_cleared = tx.execute("DELETE FROM quest_completions", [])?;

            tx.commit()?;
            Ok(RolloverSummary {
                year,
                streaks_archived,
                quest_tallies_archived,
                streaks_reset,
                completions_cleared,
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}
