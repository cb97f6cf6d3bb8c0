use chrono::{ DateTime, NaiveDate, NaiveTime, Utc };
use serde::{ Deserialize, Serialize };
use std::fmt;
use std::str::FromStr;

pub const TITLE_MAX_LEN: usize = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    #[default]
    Chat,
    Text,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Chat => "chat",
            PlanType::Text => "text",
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(PlanType::Chat),
            "text" => Ok(PlanType::Text),
            other => Err(format!("Unknown plan type: '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub plan_type: PlanType,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "chat")]
    pub chat_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NewPlan {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub plan_type: PlanType,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub is_pinned: bool,
}

/// Partial update. A `null` description/date/time clears the field; an absent one leaves it.
#[derive(Debug, Default, Deserialize)]
pub struct PlanUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub plan_type: Option<PlanType>,
    #[serde(default, deserialize_with = "double_option")]
    pub date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub time: Option<Option<NaiveTime>>,
    pub is_pinned: Option<bool>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
pub struct PlanRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl PlanRange {
    /// Both bounds are needed; a half-open range is ignored.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}
