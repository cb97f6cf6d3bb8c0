//! History replay: turns a stored conversation back into model input.

use crate::llm::chat::{ ChatRole, PromptMessage };
use crate::models::chat::Turn;

/// Role of a stored turn from the point of view of `user_id`. Anything the
/// requesting user didn't send is treated as the assistant speaking.
pub fn role_for(turn: &Turn, user_id: i64) -> ChatRole {
    if turn.sender_id == user_id { ChatRole::User } else { ChatRole::Assistant }
}

/// Replays `turns` (already in chronological order). With `limit > 0` only the
/// most recent `limit` turns are kept.
pub fn to_prompt_messages(turns: &[Turn], user_id: i64, limit: usize) -> Vec<PromptMessage> {
    let start = if limit > 0 { turns.len().saturating_sub(limit) } else { 0 };
    turns[start..]
        .iter()
        .map(|turn| PromptMessage { role: role_for(turn, user_id), content: turn.content.clone() })
        .collect()
}

fn speaker_label(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "User",
        ChatRole::Assistant => "Assistant",
        ChatRole::System => "System",
    }
}

pub fn transcript_line(role: ChatRole, content: &str) -> String {
    format!("{}: {}", speaker_label(role), content)
}

pub fn format_transcript(turns: &[Turn], user_id: i64) -> String {
    turns
        .iter()
        .map(|turn| transcript_line(role_for(turn, user_id), &turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}
