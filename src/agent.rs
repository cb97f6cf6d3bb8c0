use crate::cli::Args;
use crate::config::prompt::{ self, PromptConfig, PromptError };
use crate::db::{ self, StoreError };
use crate::history;
use crate::llm::LlmConfig;
use crate::llm::chat::{ ChatClient, ChatRole, PromptMessage, new_client as new_chat_client };
use crate::models::chat::{ Conversation, Turn, TOPIC_SUMMARY_MAX_LEN };
use crate::models::user::User;

use chrono::Utc;
use log::{ info, warn };
use sqlx::SqlitePool;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("user {0} has not completed their profile")]
    ProfileMissing(i64),
    #[error("{0}")]
    Completion(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for AssistantError {
    fn from(err: sqlx::Error) -> Self {
        AssistantError::Store(err.into())
    }
}

/// One persisted user/assistant round trip.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub user_turn: Turn,
    pub assistant_turn: Turn,
    /// Full transcript including the new pair.
    pub chat_log: String,
}

#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub prompts_path: PathBuf,
    pub assistant_username: String,
    pub history_limit: usize,
}

impl AssistantSettings {
    pub fn from_args(args: &Args) -> Self {
        Self {
            prompts_path: PathBuf::from(&args.prompts_path),
            assistant_username: args.assistant_username.clone(),
            history_limit: args.history_limit,
        }
    }
}

pub struct Assistant {
    chat_client: Arc<dyn ChatClient>,
    summary_client: Arc<dyn ChatClient>,
    prompt_config: RwLock<Arc<PromptConfig>>,
    db: SqlitePool,
    bot: User,
    settings: AssistantSettings,
}

impl Assistant {
    fn initialize_llm_clients(
        args: &Args
    ) -> Result<(Arc<dyn ChatClient>, Arc<dyn ChatClient>), Box<dyn Error + Send + Sync>> {
        let chat_config = LlmConfig::chat_from_args(args)?;
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={}",
            chat_config.llm_type,
            chat_client.get_model(),
            chat_client.get_base_url().as_deref().unwrap_or("adapter default")
        );

        let summary_config = LlmConfig::summary_from_args(args)?;
        let summary_client = new_chat_client(&summary_config)?;
        info!(
            "Summary client configured: Type={}, Model={}, BaseURL={}",
            summary_config.llm_type,
            summary_client.get_model(),
            summary_client.get_base_url().as_deref().unwrap_or("adapter default")
        );

        Ok((chat_client, summary_client))
    }

    pub async fn new(args: &Args, db: SqlitePool) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let (chat_client, summary_client) = Self::initialize_llm_clients(args)?;
        let settings = AssistantSettings::from_args(args);
        let prompt_config = prompt::load_prompts(&settings.prompts_path)?;
        Ok(Self::with_clients(db, chat_client, summary_client, prompt_config, settings).await?)
    }

    /// Builds an assistant around already-constructed backends.
    pub async fn with_clients(
        db: SqlitePool,
        chat_client: Arc<dyn ChatClient>,
        summary_client: Arc<dyn ChatClient>,
        prompt_config: Arc<PromptConfig>,
        settings: AssistantSettings
    ) -> Result<Self, StoreError> {
        let bot = db::users::get_or_create(&db, &settings.assistant_username).await?;
        info!("Assistant speaks as @{} (user {})", bot.username, bot.id);

        Ok(Self {
            chat_client,
            summary_client,
            prompt_config: RwLock::new(prompt_config),
            db,
            bot,
            settings,
        })
    }

    pub fn bot_user(&self) -> &User {
        &self.bot
    }

    pub async fn prompt_config(&self) -> Arc<PromptConfig> {
        Arc::clone(&*self.prompt_config.read().await)
    }

    pub async fn missing_profile_reply(&self) -> String {
        self.prompt_config().await.missing_profile_reply.clone()
    }

    /// Runs the full pipeline for one user message: profile context, history
    /// replay, completion, persistence, then duration and summary bookkeeping.
    ///
    /// Nothing is written when the profile is missing or the completion fails.
    pub async fn respond(
        &self,
        chat: &Conversation,
        user_id: i64,
        input: &str
    ) -> Result<Exchange, AssistantError> {
        let input = input.trim();
        let profile = db::profiles
            ::get_for_user(&self.db, user_id).await?
            .ok_or(AssistantError::ProfileMissing(user_id))?;
        let prompts = self.prompt_config().await;

        let history_turns = db::turns::list_for_chat(&self.db, chat.id).await?;
        let mut messages = Vec::with_capacity(history_turns.len() + 2);
        messages.push(PromptMessage::system(prompt::get_system_prompt(&prompts, &profile)));
        messages.extend(history::to_prompt_messages(&history_turns, user_id, self.settings.history_limit));
        messages.push(PromptMessage::user(input));

        let reply = self.chat_client
            .complete(&messages).await
            .map_err(|e| AssistantError::Completion(e.to_string()))?
            .response
            .trim()
            .to_string();

        let (user_turn, assistant_turn) = self.persist_pair(chat.id, user_id, input, &reply).await?;

        let duration_secs = (Utc::now() - chat.created_at).num_seconds().max(0);
        db::chats::set_duration(&self.db, chat.id, duration_secs).await?;

        let mut chat_log = history::format_transcript(&history_turns, user_id);
        for (role, content) in [(ChatRole::User, input), (ChatRole::Assistant, reply.as_str())] {
            if !chat_log.is_empty() {
                chat_log.push('\n');
            }
            chat_log.push_str(&history::transcript_line(role, content));
        }

        self.summarize(&prompts, chat.id, &chat_log).await?;
        info!(
            "Chat {}: exchange stored (turns {} and {}), duration {}s",
            chat.id,
            user_turn.id,
            assistant_turn.id,
            duration_secs
        );

        Ok(Exchange { user_turn, assistant_turn, chat_log })
    }

    /// Stores a user turn together with a canned assistant reply, for callers
    /// that still want the exchange recorded after `respond` failed.
    pub async fn record_fallback(
        &self,
        chat_id: i64,
        user_id: i64,
        input: &str,
        reply: &str
    ) -> Result<(Turn, Turn), AssistantError> {
        self.persist_pair(chat_id, user_id, input.trim(), reply).await
    }

    async fn persist_pair(
        &self,
        chat_id: i64,
        user_id: i64,
        input: &str,
        reply: &str
    ) -> Result<(Turn, Turn), AssistantError> {
        let mut tx = self.db.begin().await?;
        db::chats::add_participant(&mut *tx, chat_id, self.bot.id).await?;
        let user_turn = db::turns::insert(&mut *tx, chat_id, user_id, input).await?;
        let assistant_turn = db::turns::insert(&mut *tx, chat_id, self.bot.id, reply).await?;
        tx.commit().await?;
        Ok((user_turn, assistant_turn))
    }

    async fn summarize(
        &self,
        prompts: &PromptConfig,
        chat_id: i64,
        transcript: &str
    ) -> Result<(), AssistantError> {
        let summary_prompt = prompt::get_summary_prompt(prompts, transcript);
        let summary = match self.summary_client.complete_prompt(&summary_prompt).await {
            Ok(resp) => truncate_summary(&resp.response),
            Err(e) => {
                warn!("Chat {}: summary generation failed, keeping previous summary: {}", chat_id, e);
                return Ok(());
            }
        };

        if summary.is_empty() {
            warn!("Chat {}: summary backend returned nothing, keeping previous summary", chat_id);
            return Ok(());
        }

        db::chats::set_topic_summary(&self.db, chat_id, &summary).await?;
        Ok(())
    }

    pub async fn reload_prompts_if_changed(&self) -> Result<bool, PromptError> {
        let mut guard = self.prompt_config.write().await;
        match prompt::reload_prompts_if_changed(&self.settings.prompts_path, &guard)? {
            Some(new_config) => {
                *guard = new_config;
                info!("Prompts successfully reloaded");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

pub fn truncate_summary(raw: &str) -> String {
    raw.trim().chars().take(TOPIC_SUMMARY_MAX_LEN).collect()
}
