// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Group chat registry.

use rusqlite::params;
use streakbot_core::StreakbotError;
use streakbot_core::types::{ChatId, GroupChat};

use crate::database::Database;

/// Insert a chat or refresh its title. A missing title keeps the stored one.
pub async fn register_chat(
    db: &Database,
    chat_id: ChatId,
    title: Option<&str>,
) -> Result<(), StreakbotError> {
    let title = title.map(str::to_string);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO group_chats (chat_id, title) VALUES (?1, ?2)
                 ON CONFLICT(chat_id) DO UPDATE SET
                     title = COALESCE(excluded.title, group_chats.title),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![chat_id.0, title],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All registered chats, oldest id first.
pub async fn list_chats(db: &Database) -> Result<Vec<GroupChat>, StreakbotError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT chat_id, title FROM group_chats ORDER BY chat_id")?;
            let rows = stmt.query_map([], |row| {
                Ok(GroupChat {
                    chat_id: ChatId(row.get(0)?),
                    title: row.get(1)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
