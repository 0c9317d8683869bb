// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quest completions and the current-cycle leaderboard.

use chrono::NaiveDate;
use rusqlite::params;
use streakbot_core::StreakbotError;
use streakbot_core::types::{ChatId, QuestCompletion, QuestScore, UserId};

use crate::database::Database;

/// Tags the user completed in the chat on `date`.
pub async fn completed_tags(
    db: &Database,
    chat_id: ChatId,
    user_id: UserId,
    date: NaiveDate,
) -> Result<Vec<String>, StreakbotError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT tag FROM quest_completions
                 WHERE chat_id = ?1 AND user_id = ?2 AND date = ?3 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![chat_id.0, user_id.0, date], |row| row.get(0))?;
            rows.collect::<Result<Vec<String>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert-or-ignore on (chat, user, tag, date). Returns `true` if a row was written.
pub async fn insert_completion(
    db: &Database,
    completion: &QuestCompletion,
) -> Result<bool, StreakbotError> {
    let c = completion.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO quest_completions (chat_id, user_id, display_name, tag, date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![c.chat_id.0, c.user_id.0, c.display_name, c.tag, c.date],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Completions per user in the chat, most first.
///
/// Ties are ordered by each user's first completion. The name shown is the
/// one recorded with the user's latest completion.
pub async fn quest_scores(
    db: &Database,
    chat_id: ChatId,
) -> Result<Vec<QuestScore>, StreakbotError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT c.user_id,
                        (SELECT l.display_name FROM quest_completions l
                          WHERE l.chat_id = c.chat_id AND l.user_id = c.user_id
                          ORDER BY l.id DESC LIMIT 1) AS name,
                        COUNT(*) AS total,
                        MIN(c.id) AS first_id
                 FROM quest_completions c
                 WHERE c.chat_id = ?1
                 GROUP BY c.chat_id, c.user_id
                 ORDER BY total DESC, first_id ASC",
            )?;
            let rows = stmt.query_map(params![chat_id.0], |row| {
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
