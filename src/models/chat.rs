use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };
use sqlx::FromRow;

pub const DEFAULT_TOPIC_SUMMARY: &str = "General Chat";
pub const TOPIC_SUMMARY_MAX_LEN: usize = 255;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub participants: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub topic_summary: String,
    /// Seconds between creation and the latest assistant exchange.
    #[serde(rename = "total_chat_duration")]
    pub total_duration_secs: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Turn {
    pub id: i64,
    #[serde(rename = "chat")]
    pub chat_id: i64,
    #[serde(rename = "sender")]
    pub sender_id: i64,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_pinned: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewConversation {
    #[serde(default)]
    pub participants: Vec<i64>,
    pub topic_summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConversationUpdate {
    pub participants: Option<Vec<i64>>,
    pub topic_summary: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewTurn {
    pub chat: i64,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TurnUpdate {
    pub content: Option<String>,
    pub is_pinned: Option<bool>,
}
