use chrono::{ DateTime, NaiveDate, NaiveTime, Utc };
use sqlx::{ FromRow, SqlitePool };

use super::{ StoreError, StoreResult };
use crate::models::plan::{ NewPlan, Plan, PlanRange, PlanUpdate };

#[derive(FromRow)]
struct PlanRow {
    id: i64,
    user_id: i64,
    title: String,
    description: Option<String>,
    plan_type: String,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    is_pinned: bool,
    created_at: DateTime<Utc>,
    chat_id: Option<i64>,
}

impl TryFrom<PlanRow> for Plan {
    type Error = StoreError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        Ok(Plan {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            plan_type: row.plan_type.parse().map_err(StoreError::Corrupt)?,
            date: row.date,
            time: row.time,
            is_pinned: row.is_pinned,
            created_at: row.created_at,
            chat_id: row.chat_id,
        })
    }
}

const COLUMNS: &str = "id, user_id, title, description, plan_type, date, time, is_pinned, created_at, chat_id";

/// Undated plans sort after dated ones.
pub async fn list_for_user(pool: &SqlitePool, user_id: i64, range: &PlanRange) -> StoreResult<Vec<Plan>> {
    let rows = match range.bounds() {
        Some((start, end)) => {
            sqlx::query_as::<_, PlanRow>(&format!(
                "SELECT {COLUMNS} FROM plans WHERE user_id = ? AND date BETWEEN ? AND ?
                 ORDER BY date ASC, id ASC"
            ))
                .bind(user_id)
                .bind(start)
                .bind(end)
                .fetch_all(pool)
                .await?
        }
        None => {
            sqlx::query_as::<_, PlanRow>(&format!(
                "SELECT {COLUMNS} FROM plans WHERE user_id = ?
                 ORDER BY date IS NULL, date ASC, id ASC"
            ))
                .bind(user_id)
                .fetch_all(pool)
                .await?
        }
    };

    rows.into_iter().map(Plan::try_from).collect()
}

pub async fn count_for_user(pool: &SqlitePool, user_id: i64) -> StoreResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM plans WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Inserts the plan together with its own chat, owned by the plan's author.
pub async fn create(pool: &SqlitePool, user_id: i64, plan: &NewPlan) -> StoreResult<Plan> {
    let mut tx = pool.begin().await?;
    let created_at = Utc::now();

    let chat_id = sqlx::query("INSERT INTO chats (created_at, topic_summary, total_duration_secs) VALUES (?, ?, 0)")
        .bind(created_at)
        .bind(crate::models::chat::DEFAULT_TOPIC_SUMMARY)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    sqlx::query("INSERT INTO chat_participants (chat_id, user_id) VALUES (?, ?)")
        .bind(chat_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let id = sqlx::query(
        "INSERT INTO plans (user_id, title, description, plan_type, date, time, is_pinned, created_at, chat_id)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
    )
        .bind(user_id)
        .bind(&plan.title)
        .bind(&plan.description)
        .bind(plan.plan_type.as_str())
        .bind(plan.date)
        .bind(plan.time)
        .bind(plan.is_pinned)
        .bind(created_at)
        .bind(chat_id)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    tx.commit().await?;

    Ok(Plan {
        id,
        user_id,
        title: plan.title.clone(),
        description: plan.description.clone(),
        plan_type: plan.plan_type,
        date: plan.date,
        time: plan.time,
        is_pinned: plan.is_pinned,
        created_at,
        chat_id: Some(chat_id),
    })
}

pub async fn get_for_user(pool: &SqlitePool, plan_id: i64, user_id: i64) -> StoreResult<Option<Plan>> {
    let row = sqlx::query_as::<_, PlanRow>(&format!("SELECT {COLUMNS} FROM plans WHERE id = ? AND user_id = ?"))
        .bind(plan_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    row.map(Plan::try_from).transpose()
}

pub async fn update(pool: &SqlitePool, current: Plan, changes: PlanUpdate) -> StoreResult<Plan> {
    let plan = Plan {
        title: changes.title.unwrap_or(current.title),
        description: changes.description.unwrap_or(current.description),
        plan_type: changes.plan_type.unwrap_or(current.plan_type),
        date: changes.date.unwrap_or(current.date),
        time: changes.time.unwrap_or(current.time),
        is_pinned: changes.is_pinned.unwrap_or(current.is_pinned),
        ..current
    };

    sqlx::query(
        "UPDATE plans SET title = ?, description = ?, plan_type = ?, date = ?, time = ?, is_pinned = ? WHERE id = ?"
    )
        .bind(&plan.title)
        .bind(&plan.description)
        .bind(plan.plan_type.as_str())
        .bind(plan.date)
        .bind(plan.time)
        .bind(plan.is_pinned)
        .bind(plan.id)
        .execute(pool)
        .await?;

    Ok(plan)
}

pub async fn delete(pool: &SqlitePool, plan_id: i64) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM plans WHERE id = ?")
        .bind(plan_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
