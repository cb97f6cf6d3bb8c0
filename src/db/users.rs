use chrono::Utc;
use sqlx::SqlitePool;

use super::StoreResult;
use crate::models::user::User;

pub async fn get_or_create(pool: &SqlitePool, username: &str) -> StoreResult<User> {
    sqlx::query("INSERT INTO users (username, created_at) VALUES (?, ?) ON CONFLICT(username) DO NOTHING")
        .bind(username)
        .bind(Utc::now())
        .execute(pool)
        .await?;

    let user = sqlx::query_as::<_, User>("SELECT id, username, created_at FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(pool)
        .await?;
    Ok(user)
}

pub async fn exists(pool: &SqlitePool, user_id: i64) -> StoreResult<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let pool = test_pool().await;
        let first = get_or_create(&pool, "coach_k").await.unwrap();
        let second = get_or_create(&pool, "coach_k").await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(exists(&pool, first.id).await.unwrap());
        assert!(!exists(&pool, first.id + 100).await.unwrap());
    }
}
