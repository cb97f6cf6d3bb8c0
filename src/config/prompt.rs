use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use log::info;

use crate::models::profile::Profile;

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("Prompt template '{0}' is empty")]
    EmptyTemplate(&'static str),
    #[error("Prompt file IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Prompt JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

const DEFAULT_SYSTEM_PERSONA: &str = "You are a concise, smart, and context-aware assistant who gives sharp, relevant replies only.
This user is a sports coach. They specialize in: **{specialty}**.
Here's what the user said about themselves:
---
{bio}
---
Use this info to personalize your tone, advice, examples, and especially team-specific responses.
If they ask about \"my team\", infer from the text above.
Do not give general explanations. Focus only on what they ask.
Keep answers short and inline unless explicitly asked for depth.";

const DEFAULT_SUMMARY: &str = "Summarize this conversation into a single paragraph. Focus on what the user asked, what they were interested in, and what the assistant provided:

{chat}";

const DEFAULT_MISSING_PROFILE_REPLY: &str = "User profile missing. Please complete your About section.";

fn default_system_persona() -> String {
    DEFAULT_SYSTEM_PERSONA.to_string()
}

fn default_summary() -> String {
    DEFAULT_SUMMARY.to_string()
}

fn default_missing_profile_reply() -> String {
    DEFAULT_MISSING_PROFILE_REPLY.to_string()
}

#[derive(Deserialize, Debug, Clone)]
pub struct PromptConfig {
    /// Placeholders: `{specialty}`, `{bio}`.
    #[serde(default = "default_system_persona")]
    pub system_persona: String,
    /// Placeholder: `{chat}`.
    #[serde(default = "default_summary")]
    pub summary: String,
    #[serde(default = "default_missing_profile_reply")]
    pub missing_profile_reply: String,
    #[serde(skip)]
    pub last_loaded: Option<SystemTime>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_persona: default_system_persona(),
            summary: default_summary(),
            missing_profile_reply: default_missing_profile_reply(),
            last_loaded: None,
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        if self.system_persona.trim().is_empty() {
            return Err(PromptError::EmptyTemplate("system_persona"));
        }
        if self.summary.trim().is_empty() {
            return Err(PromptError::EmptyTemplate("summary"));
        }
        Ok(())
    }
}

fn read_prompts(path: &Path) -> Result<PromptConfig, PromptError> {
    let file_content = fs::read_to_string(path)?;
    let mut config: PromptConfig = serde_json::from_str(&file_content)?;
    config.validate()?;
    config.last_loaded = Some(SystemTime::now());
    Ok(config)
}

/// Loads the prompt file, falling back to the built-in prompts when it does not exist.
pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<Arc<PromptConfig>, PromptError> {
    let path = path.as_ref();
    match read_prompts(path) {
        Ok(config) => {
            info!("Loaded prompts from {}", path.display());
            Ok(Arc::new(config))
        }
        Err(PromptError::IoError(e)) if e.kind() == ErrorKind::NotFound => {
            info!("Prompts file {} not found, using built-in prompts", path.display());
            Ok(Arc::new(PromptConfig::default()))
        }
        Err(e) => Err(e),
    }
}

pub fn reload_prompts_if_changed<P: AsRef<Path>>(
    path: P,
    current_config: &Arc<PromptConfig>
) -> Result<Option<Arc<PromptConfig>>, PromptError> {
    let metadata = match fs::metadata(&path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if let Ok(modified) = metadata.modified() {
        if let Some(last_loaded) = current_config.last_loaded {
            if modified > last_loaded {
                info!("Prompts file changed, reloading...");
                return Ok(Some(Arc::new(read_prompts(path.as_ref())?)));
            }
        } else {
            info!("No last_loaded timestamp, reloading prompts...");
            return Ok(Some(Arc::new(read_prompts(path.as_ref())?)));
        }
    }
    Ok(None)
}

pub fn get_system_prompt(config: &PromptConfig, profile: &Profile) -> String {
    config.system_persona
        .replace("{specialty}", profile.specialty.trim())
        .replace("{bio}", profile.bio.trim())
}

pub fn get_summary_prompt(config: &PromptConfig, transcript: &str) -> String {
    config.summary.replace("{chat}", transcript)
}
