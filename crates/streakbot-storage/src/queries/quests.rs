// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quest catalog and daily assignments.

use chrono::NaiveDate;
use rusqlite::{Connection, TransactionBehavior, params};
use streakbot_core::StreakbotError;
use streakbot_core::types::{ChatId, DailyQuest, DailyQuestAssignment, QuestTemplate};

use crate::database::Database;

/// Insert templates whose tag is not in the catalog yet. Returns how many were added.
pub async fn seed_templates(
    db: &Database,
    templates: &[QuestTemplate],
) -> Result<usize, StreakbotError> {
    let templates = templates.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut inserted = 0;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO quest_templates (tag, description) VALUES (?1, ?2)",
                )?;
                for template in &templates {
                    inserted += stmt.execute(params![template.tag, template.description])?;
                }
            }
            tx.commit()?;
            Ok(inserted)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The whole catalog, ordered by tag.
pub async fn list_templates(db: &Database) -> Result<Vec<QuestTemplate>, StreakbotError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT description, tag FROM quest_templates ORDER BY tag")?;
            let rows = stmt.query_map([], |row| {
                Ok(QuestTemplate {
                    description: row.get(0)?,
                    tag: row.get(1)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn select_daily(
    conn: &Connection,
    chat_id: ChatId,
    date: NaiveDate,
) -> rusqlite::Result<Vec<DailyQuest>> {
    let mut stmt = conn.prepare(
        "SELECT chat_id, date, position, description, tag FROM daily_quests
         WHERE chat_id = ?1 AND date = ?2 ORDER BY position",
    )?;
    let rows = stmt.query_map(params![chat_id.0, date], |row| {
        Ok(DailyQuest {
            chat_id: ChatId(row.get(0)?),
            date: row.get(1)?,
            position: row.get(2)?,
            description: row.get(3)?,
            tag: row.get(4)?,
        })
    })?;
    rows.collect()
}

/// Quests assigned to a chat for `date`, in listed order.
pub async fn daily_quests(
    db: &Database,
    chat_id: ChatId,
    date: NaiveDate,
) -> Result<Vec<DailyQuest>, StreakbotError> {
    db.connection()
        .call(move |conn| select_daily(conn, chat_id, date))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Distinct tags assigned to a chat between `from` and `to`, inclusive.
pub async fn recent_tags(
    db: &Database,
    chat_id: ChatId,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<String>, StreakbotError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT tag FROM daily_quests
                 WHERE chat_id = ?1 AND date BETWEEN ?2 AND ?3 ORDER BY tag",
            )?;
            let rows = stmt.query_map(params![chat_id.0, from, to], |row| row.get(0))?;
            rows.collect::<Result<Vec<String>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Store `templates` as the assignment for (chat, date) unless one exists.
pub async fn assign_daily(
    db: &Database,
    chat_id: ChatId,
    date: NaiveDate,
    templates: &[QuestTemplate],
) -> Result<DailyQuestAssignment, StreakbotError> {
    let templates = templates.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let existing = select_daily(&tx, chat_id, date)?;
            if !existing.is_empty() {
                tx.commit()?;
                return Ok(DailyQuestAssignment {
                    quests: existing,
                    created: false,
                });
            }

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO daily_quests (chat_id, date, position, description, tag)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for (position, template) in templates.iter().enumerate() {
                    stmt.execute(params![
                        chat_id.0,
                        date,
                        position as i64,
                        template.description,
                        template.tag,
                    ])?;
                }
            }
            let quests = select_daily(&tx, chat_id, date)?;
            tx.commit()?;
            Ok(DailyQuestAssignment {
                created: !quests.is_empty(),
                quests,
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}
