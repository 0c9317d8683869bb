// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streak record operations, including the atomic read-modify-write.

use rusqlite::{OptionalExtension, Row, TransactionBehavior, params};
use streakbot_core::StreakbotError;
use streakbot_core::types::{ChatId, StreakEvaluation, StreakMutation, StreakRecord, UserId};

use crate::database::Database;

const COLUMNS: &str = "chat_id, user_id, display_name, streak, last_activity, daily_count";

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<StreakRecord> {
    Ok(StreakRecord {
        chat_id: ChatId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        display_name: row.get(2)?,
        streak: row.get(3)?,
        last_activity: row.get(4)?,
        daily_count: row.get(5)?,
    })
}

/// Create a zero-state record if absent; refresh the display name either way.
pub async fn ensure_record(
    db: &Database,
    chat_id: ChatId,
    user_id: UserId,
    display_name: &str,
) -> Result<StreakRecord, StreakbotError> {
    let display_name = display_name.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "INSERT INTO streaks (chat_id, user_id, display_name) VALUES (?1, ?2, ?3)
                     ON CONFLICT(chat_id, user_id) DO UPDATE SET display_name = excluded.display_name
                     RETURNING {COLUMNS}"
                ),
                params![chat_id.0, user_id.0, display_name],
                row_to_record,
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch one record.
pub async fn get_record(
    db: &Database,
    chat_id: ChatId,
    user_id: UserId,
) -> Result<Option<StreakRecord>, StreakbotError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM streaks WHERE chat_id = ?1 AND user_id = ?2"),
                params![chat_id.0, user_id.0],
                row_to_record,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Apply `mutation` to the stored record inside an immediate transaction.
///
/// The read, the mutation, and the write all happen within one closure on
/// the connection thread, so no other call can observe or modify the row in
/// between. If the transaction fails nothing is written and the mutation's
/// decision is discarded with it.
pub async fn update_streak(
    db: &Database,
    chat_id: ChatId,
    user_id: UserId,
    display_name: &str,
    mutation: StreakMutation,
) -> Result<StreakEvaluation, StreakbotError> {
    let display_name = display_name.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let current = tx
                .query_row(
                    &format!("SELECT {COLUMNS} FROM streaks WHERE chat_id = ?1 AND user_id = ?2"),
                    params![chat_id.0, user_id.0],
                    row_to_record,
                )
                .optional()?;

            let mut evaluation = mutation(current);
            evaluation.record.chat_id = chat_id;
            evaluation.record.user_id = user_id;
            evaluation.record.display_name = display_name;

            let record = &evaluation.record;
            tx.execute(
                "INSERT INTO streaks (chat_id, user_id, display_name, streak, last_activity, daily_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(chat_id, user_id) DO UPDATE SET
                     display_name = excluded.display_name,
                     streak = excluded.streak,
                     last_activity = excluded.last_activity,
                     daily_count = excluded.daily_count",
                params![
                    chat_id.0,
                    user_id.0,
                    record.display_name,
                    record.streak,
                    record.last_activity,
                    record.daily_count,
                ],
            )?;
            tx.commit()?;
            Ok(evaluation)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All records of a chat, highest streak first, then by name.
pub async fn list_streaks(
    db: &Database,
    chat_id: ChatId,
) -> Result<Vec<StreakRecord>, StreakbotError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM streaks WHERE chat_id = ?1
                 ORDER BY streak DESC, display_name COLLATE NOCASE ASC"
            ))?;
            let rows = stmt.query_map(params![chat_id.0], row_to_record)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
