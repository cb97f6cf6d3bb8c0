use chrono::Utc;
use sqlx::{ Executor, Sqlite, SqlitePool };

use super::StoreResult;
use crate::models::chat::{ Turn, TurnUpdate };

const COLUMNS: &str = "id, chat_id, sender_id, content, timestamp, is_pinned";

/// Every turn of a chat, oldest first. Ties on timestamp keep insertion order.
pub async fn list_for_chat(pool: &SqlitePool, chat_id: i64) -> StoreResult<Vec<Turn>> {
    let turns = sqlx::query_as::<_, Turn>(
        &format!("SELECT {COLUMNS} FROM messages WHERE chat_id = ? ORDER BY timestamp ASC, id ASC")
    )
        .bind(chat_id)
        .fetch_all(pool)
        .await?;
    Ok(turns)
}

pub async fn insert<'e, E>(executor: E, chat_id: i64, sender_id: i64, content: &str) -> StoreResult<Turn>
where
    E: Executor<'e, Database = Sqlite>,
{
    let timestamp = Utc::now();
    let id = sqlx::query("INSERT INTO messages (chat_id, sender_id, content, timestamp, is_pinned) VALUES (?, ?, ?, ?, 0)")
        .bind(chat_id)
        .bind(sender_id)
        .bind(content)
        .bind(timestamp)
        .execute(executor)
        .await?
        .last_insert_rowid();

    Ok(Turn {
        id,
        chat_id,
        sender_id,
        content: content.to_string(),
        timestamp,
        is_pinned: false,
    })
}

/// Fetches a turn only if `user_id` takes part in its chat.
pub async fn get_for_participant(pool: &SqlitePool, turn_id: i64, user_id: i64) -> StoreResult<Option<Turn>> {
    let turn = sqlx::query_as::<_, Turn>(
        "SELECT m.id, m.chat_id, m.sender_id, m.content, m.timestamp, m.is_pinned
         FROM messages m JOIN chat_participants p ON p.chat_id = m.chat_id
         WHERE m.id = ? AND p.user_id = ?"
    )
        .bind(turn_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(turn)
}

pub async fn update(pool: &SqlitePool, current: Turn, changes: &TurnUpdate) -> StoreResult<Turn> {
    let content = changes.content.clone().unwrap_or(current.content);
    let is_pinned = changes.is_pinned.unwrap_or(current.is_pinned);

    sqlx::query("UPDATE messages SET content = ?, is_pinned = ? WHERE id = ?")
        .bind(&content)
        .bind(is_pinned)
        .bind(current.id)
        .execute(pool)
        .await?;

    Ok(Turn { content, is_pinned, ..current })
}

pub async fn delete(pool: &SqlitePool, turn_id: i64) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(turn_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
