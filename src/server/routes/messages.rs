use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::assistant::run_with_fallback;
use super::chats::load_for_participant;
use crate::db;
use crate::models::chat::{ NewTurn, Turn, TurnUpdate };
use crate::server::api::AppState;
use crate::server::auth::AuthUser;
use crate::server::error::{ ApiError, ApiResult };
use crate::server::extract::{ Json, Path, Query };

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub chat_id: Option<i64>,
}

async fn load_turn(state: &AppState, turn_id: i64, user_id: i64) -> ApiResult<Turn> {
    db::turns::get_for_participant(&state.db, turn_id, user_id).await?
        .ok_or_else(|| ApiError::not_found("Message"))
}

/// Turns of one chat, oldest first. Without `chat_id` nothing is listed.
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(MessagesQuery { chat_id }): Query<MessagesQuery>,
) -> ApiResult<Json<Vec<Turn>>> {
    let Some(chat_id) = chat_id else {
        return Ok(Json(Vec::new()));
    };
    if !db::chats::is_participant(&state.db, chat_id, user.id).await? {
        return Ok(Json(Vec::new()));
    }
    Ok(Json(db::turns::list_for_chat(&state.db, chat_id).await?))
}

/// Stores the caller's message and the assistant's answer to it.
pub async fn create_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<NewTurn>,
) -> ApiResult<(StatusCode, Json<Turn>)> {
    if body.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content: this field may not be blank.".into()));
    }
    let chat = load_for_participant(&state.db, body.chat, user.id).await?;
    state.check_rate(&user.username)?;

    let pair = run_with_fallback(&state, &chat, user.id, &body.content, "[AI Error]").await?;
    Ok((StatusCode::CREATED, Json(pair.user_turn)))
}

pub async fn get_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(turn_id): Path<i64>,
) -> ApiResult<Json<Turn>> {
    Ok(Json(load_turn(&state, turn_id, user.id).await?))
}

pub async fn update_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(turn_id): Path<i64>,
    Json(changes): Json<TurnUpdate>,
) -> ApiResult<Json<Turn>> {
    let current = load_turn(&state, turn_id, user.id).await?;
    Ok(Json(db::turns::update(&state.db, current, &changes).await?))
}

pub async fn delete_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(turn_id): Path<i64>,
) -> ApiResult<StatusCode> {
    load_turn(&state, turn_id, user.id).await?;
    db::turns::delete(&state.db, turn_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
