use chrono::{ DateTime, Utc };
use sqlx::{ Executor, FromRow, Sqlite, SqlitePool };

use super::StoreResult;
use crate::models::chat::{ Conversation, DEFAULT_TOPIC_SUMMARY };

#[derive(FromRow)]
struct ChatRow {
    id: i64,
    created_at: DateTime<Utc>,
    topic_summary: String,
    total_duration_secs: i64,
}

impl ChatRow {
    fn into_conversation(self, participants: Vec<i64>) -> Conversation {
        Conversation {
            id: self.id,
            participants,
            created_at: self.created_at,
            topic_summary: self.topic_summary,
            total_duration_secs: self.total_duration_secs,
        }
    }
}

async fn participants(pool: &SqlitePool, chat_id: i64) -> StoreResult<Vec<i64>> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT user_id FROM chat_participants WHERE chat_id = ? ORDER BY user_id"
    )
        .bind(chat_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

async fn hydrate(pool: &SqlitePool, row: ChatRow) -> StoreResult<Conversation> {
    let participants = participants(pool, row.id).await?;
    Ok(row.into_conversation(participants))
}

pub async fn list_for_participant(pool: &SqlitePool, user_id: i64) -> StoreResult<Vec<Conversation>> {
    let rows = sqlx::query_as::<_, ChatRow>(
        "SELECT c.id, c.created_at, c.topic_summary, c.total_duration_secs
         FROM chats c JOIN chat_participants p ON p.chat_id = c.id
         WHERE p.user_id = ? ORDER BY c.created_at DESC, c.id DESC"
    )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    let mut conversations = Vec::with_capacity(rows.len());
    for row in rows {
        conversations.push(hydrate(pool, row).await?);
    }
    Ok(conversations)
}

pub async fn get(pool: &SqlitePool, chat_id: i64) -> StoreResult<Option<Conversation>> {
    let row = sqlx::query_as::<_, ChatRow>(
        "SELECT id, created_at, topic_summary, total_duration_secs FROM chats WHERE id = ?"
    )
        .bind(chat_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(hydrate(pool, row).await?)),
        None => Ok(None),
    }
}

/// Fetches a chat only if `user_id` takes part in it.
pub async fn get_for_participant(
    pool: &SqlitePool,
    chat_id: i64,
    user_id: i64
) -> StoreResult<Option<Conversation>> {
    if !is_participant(pool, chat_id, user_id).await? {
        return Ok(None);
    }
    get(pool, chat_id).await
}

pub async fn is_participant(pool: &SqlitePool, chat_id: i64, user_id: i64) -> StoreResult<bool> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT 1 FROM chat_participants WHERE chat_id = ? AND user_id = ?"
    )
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

pub async fn create(
    pool: &SqlitePool,
    participant_ids: &[i64],
    topic_summary: Option<&str>
) -> StoreResult<Conversation> {
    let mut tx = pool.begin().await?;
    let created_at = Utc::now();
    let summary = topic_summary.unwrap_or(DEFAULT_TOPIC_SUMMARY);

    let id = sqlx::query("INSERT INTO chats (created_at, topic_summary, total_duration_secs) VALUES (?, ?, 0)")
        .bind(created_at)
        .bind(summary)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    for user_id in participant_ids {
        sqlx::query("INSERT OR IGNORE INTO chat_participants (chat_id, user_id) VALUES (?, ?)")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    let mut participants = participant_ids.to_vec();
    participants.sort_unstable();
    participants.dedup();

    Ok(Conversation {
        id,
        participants,
        created_at,
        topic_summary: summary.to_string(),
        total_duration_secs: 0,
    })
}

/// Accepts a pool or an open transaction.
pub async fn add_participant<'e, E>(executor: E, chat_id: i64, user_id: i64) -> StoreResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT OR IGNORE INTO chat_participants (chat_id, user_id) VALUES (?, ?)")
        .bind(chat_id)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn set_participants(pool: &SqlitePool, chat_id: i64, participant_ids: &[i64]) -> StoreResult<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM chat_participants WHERE chat_id = ?")
        .bind(chat_id)
        .execute(&mut *tx)
        .await?;
    for user_id in participant_ids {
        sqlx::query("INSERT OR IGNORE INTO chat_participants (chat_id, user_id) VALUES (?, ?)")
            .bind(chat_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn set_topic_summary(pool: &SqlitePool, chat_id: i64, summary: &str) -> StoreResult<()> {
    sqlx::query("UPDATE chats SET topic_summary = ? WHERE id = ?")
        .bind(summary)
        .bind(chat_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_duration(pool: &SqlitePool, chat_id: i64, duration_secs: i64) -> StoreResult<()> {
    sqlx::query("UPDATE chats SET total_duration_secs = ? WHERE id = ?")
        .bind(duration_secs)
        .bind(chat_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, chat_id: i64) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM chats WHERE id = ?")
        .bind(chat_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
