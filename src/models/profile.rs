use serde::{ Deserialize, Serialize };
use sqlx::FromRow;

pub const SPECIALTY_MAX_LEN: usize = 100;

/// What a coach told us about themselves. Feeds the assistant's system prompt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: i64,
    #[serde(rename = "user")]
    pub user_id: i64,
    pub specialty: String,
    pub bio: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileInput {
    #[serde(default, alias = "sport_coach")]
    pub specialty: Option<String>,
    #[serde(default, alias = "details")]
    pub bio: Option<String>,
}
