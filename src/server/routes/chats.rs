use axum::extract::State;
use axum::http::StatusCode;
use log::info;
use sqlx::SqlitePool;

use crate::db;
use crate::models::chat::{ Conversation, ConversationUpdate, NewConversation, TOPIC_SUMMARY_MAX_LEN };
use crate::server::api::AppState;
use crate::server::auth::AuthUser;
use crate::server::error::{ ApiError, ApiResult };
use crate::server::extract::{ Json, Path };

fn validate_summary(summary: Option<&str>) -> ApiResult<()> {
    match summary {
        Some(s) if s.chars().count() > TOPIC_SUMMARY_MAX_LEN => Err(ApiError::BadRequest(
            format!("topic_summary: ensure this field has no more than {} characters.", TOPIC_SUMMARY_MAX_LEN)
        )),
        _ => Ok(()),
    }
}

/// Requested participants plus the caller, each checked to exist.
async fn resolve_participants(pool: &SqlitePool, requested: &[i64], caller_id: i64) -> ApiResult<Vec<i64>> {
    let mut ids = Vec::with_capacity(requested.len() + 1);
    ids.push(caller_id);
    for &id in requested {
        if !db::users::exists(pool, id).await? {
            return Err(ApiError::BadRequest(format!("participants: invalid pk \"{}\" - object does not exist.", id)));
        }
        ids.push(id);
    }
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

pub(crate) async fn load_for_participant(pool: &SqlitePool, chat_id: i64, user_id: i64) -> ApiResult<Conversation> {
    db::chats::get_for_participant(pool, chat_id, user_id).await?
        .ok_or_else(|| ApiError::not_found("Chat"))
}

pub async fn list_chats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<Conversation>>> {
    Ok(Json(db::chats::list_for_participant(&state.db, user.id).await?))
}

pub async fn create_chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<NewConversation>,
) -> ApiResult<(StatusCode, Json<Conversation>)> {
    validate_summary(body.topic_summary.as_deref())?;
    let participants = resolve_participants(&state.db, &body.participants, user.id).await?;
    let chat = db::chats::create(&state.db, &participants, body.topic_summary.as_deref()).await?;
    info!("Chat {} created by @{}", chat.id, user.username);
    Ok((StatusCode::CREATED, Json(chat)))
}

pub async fn get_chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<i64>,
) -> ApiResult<Json<Conversation>> {
    Ok(Json(load_for_participant(&state.db, chat_id, user.id).await?))
}

pub async fn update_chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<i64>,
    Json(body): Json<ConversationUpdate>,
) -> ApiResult<Json<Conversation>> {
    load_for_participant(&state.db, chat_id, user.id).await?;
    validate_summary(body.topic_summary.as_deref())?;

    if let Some(requested) = &body.participants {
        let participants = resolve_participants(&state.db, requested, user.id).await?;
        db::chats::set_participants(&state.db, chat_id, &participants).await?;
    }
    if let Some(summary) = &body.topic_summary {
        db::chats::set_topic_summary(&state.db, chat_id, summary).await?;
    }

    Ok(Json(load_for_participant(&state.db, chat_id, user.id).await?))
}

pub async fn delete_chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<i64>,
) -> ApiResult<StatusCode> {
    load_for_participant(&state.db, chat_id, user.id).await?;
    db::chats::delete(&state.db, chat_id).await?;
    info!("Chat {} deleted by @{}", chat_id, user.username);
    Ok(StatusCode::NO_CONTENT)
}
