use sqlx::SqlitePool;

use super::StoreResult;
use crate::models::profile::{ Profile, ProfileInput };

const COLUMNS: &str = "id, user_id, specialty, bio";

pub async fn get_for_user(pool: &SqlitePool, user_id: i64) -> StoreResult<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>(&format!("SELECT {COLUMNS} FROM profiles WHERE user_id = ?"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(profile)
}

/// Returns `None` when the user already has a profile.
pub async fn create(pool: &SqlitePool, user_id: i64, input: &ProfileInput) -> StoreResult<Option<Profile>> {
    let result = sqlx::query(
        "INSERT INTO profiles (user_id, specialty, bio) VALUES (?, ?, ?) ON CONFLICT(user_id) DO NOTHING"
    )
        .bind(user_id)
        .bind(input.specialty.as_deref().unwrap_or_default())
        .bind(input.bio.as_deref().unwrap_or_default())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_for_user(pool, user_id).await
}

pub async fn get_or_create_empty(pool: &SqlitePool, user_id: i64) -> StoreResult<Profile> {
    if let Some(profile) = get_for_user(pool, user_id).await? {
        return Ok(profile);
    }
    create(pool, user_id, &ProfileInput::default()).await?;
    let profile = sqlx::query_as::<_, Profile>(&format!("SELECT {COLUMNS} FROM profiles WHERE user_id = ?"))
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(profile)
}

pub async fn update(pool: &SqlitePool, user_id: i64, input: &ProfileInput) -> StoreResult<Profile> {
    let current = get_or_create_empty(pool, user_id).await?;
    let specialty = input.specialty.as_deref().unwrap_or(&current.specialty);
    let bio = input.bio.as_deref().unwrap_or(&current.bio);

    sqlx::query("UPDATE profiles SET specialty = ?, bio = ? WHERE id = ?")
        .bind(specialty)
        .bind(bio)
        .bind(current.id)
        .execute(pool)
        .await?;

    Ok(Profile {
        specialty: specialty.to_string(),
        bio: bio.to_string(),
        ..current
    })
}
