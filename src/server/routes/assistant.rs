use axum::extract::State;
use log::warn;
use serde::{ Deserialize, Serialize };

use super::chats::load_for_participant;
use crate::agent::AssistantError;
use crate::models::chat::{ Conversation, Turn };
use crate::server::api::AppState;
use crate::server::auth::AuthUser;
use crate::server::error::{ ApiError, ApiResult };
use crate::server::extract::{ Json, Path };

#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssistantReply {
    pub reply: String,
    pub chat_log: String,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub chat_id: Option<i64>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RespondReply {
    pub user_message: String,
    pub bot_response: String,
}

/// The stored pair for one message, whether the model answered or not.
pub(crate) struct RecordedPair {
    pub user_turn: Turn,
    pub assistant_turn: Turn,
}

/// Runs the pipeline. When the profile is missing or the model fails the
/// message is still stored, answered by a canned reply; `error_prefix`
/// heads the reply for model failures.
pub(crate) async fn run_with_fallback(
    state: &AppState,
    chat: &Conversation,
    user_id: i64,
    input: &str,
    error_prefix: &str
) -> ApiResult<RecordedPair> {
    let reply = match state.assistant.respond(chat, user_id, input).await {
        Ok(exchange) => {
            return Ok(RecordedPair {
                user_turn: exchange.user_turn,
                assistant_turn: exchange.assistant_turn,
            });
        }
        Err(AssistantError::ProfileMissing(_)) => state.assistant.missing_profile_reply().await,
        Err(AssistantError::Completion(e)) => {
            warn!("Chat {}: completion failed: {}", chat.id, e);
            format!("{}: {}", error_prefix, e)
        }
        Err(e) => return Err(e.into()),
    };

    let (user_turn, assistant_turn) = state.assistant.record_fallback(chat.id, user_id, input, &reply).await?;
    Ok(RecordedPair { user_turn, assistant_turn })
}

/// Asks the assistant inside a chat the caller belongs to. Failures are
/// reported in the reply and leave the chat untouched.
pub async fn chat_with_assistant(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<i64>,
    Json(body): Json<AssistantRequest>,
) -> ApiResult<Json<AssistantReply>> {
    let message = body.message.as_deref().map(str::trim).unwrap_or_default();
    if message.is_empty() {
        return Err(ApiError::BadRequest("No message provided.".into()));
    }
    let chat = load_for_participant(&state.db, chat_id, user.id).await?;
    state.check_rate(&user.username)?;

    let reply = match state.assistant.respond(&chat, user.id, message).await {
        Ok(exchange) => AssistantReply {
            reply: exchange.assistant_turn.content,
            chat_log: exchange.chat_log,
        },
        Err(AssistantError::ProfileMissing(_)) => AssistantReply {
            reply: state.assistant.missing_profile_reply().await,
            chat_log: String::new(),
        },
        Err(AssistantError::Completion(e)) => {
            warn!("Chat {}: completion failed: {}", chat.id, e);
            AssistantReply { reply: format!("[AI Error]: {}", e), chat_log: String::new() }
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Json(reply))
}

pub async fn respond(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<RespondRequest>,
) -> ApiResult<Json<RespondReply>> {
    let (Some(chat_id), Some(message)) = (body.chat_id, body.message.filter(|m| !m.trim().is_empty())) else {
        return Err(ApiError::BadRequest("chat_id and message are required.".into()));
    };
    let chat = load_for_participant(&state.db, chat_id, user.id).await?;
    state.check_rate(&user.username)?;

    let pair = run_with_fallback(&state, &chat, user.id, &message, "[Error generating response]").await?;
    Ok(Json(RespondReply {
        user_message: pair.user_turn.content,
        bot_response: pair.assistant_turn.content,
    }))
}
