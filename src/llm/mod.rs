pub mod chat;
use serde::{ Deserialize, Serialize };
use std::str::FromStr;
use std::fmt;

use crate::cli::Args;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmType {
    Ollama,
    OpenAI,
}

impl fmt::Display for LlmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmType::Ollama => write!(f, "ollama"),
            LlmType::OpenAI => write!(f, "openai"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseLlmTypeError {
    message: String,
}

impl fmt::Display for ParseLlmTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseLlmTypeError {}
impl FromStr for LlmType {
    type Err = ParseLlmTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(LlmType::Ollama),
            "openai" => Ok(LlmType::OpenAI),
            _ =>
                Err(ParseLlmTypeError {
                    message: format!("Invalid LLM type: '{}'", s),
                }),
        }
    }
}

/// Sampling knobs shared by every backend. Providers ignore the ones they don't support.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub repeat_penalty: f32,
    pub num_ctx: u32,
    /// Upper bound on generated tokens per reply.
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.9,
            repeat_penalty: 1.1,
            num_ctx: 4096,
            max_tokens: 2048,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub llm_type: LlmType,
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
    pub options: GenerationOptions,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_type: LlmType::Ollama,
            api_key: None,
            completion_model: None,
            base_url: None,
            options: GenerationOptions::default(),
        }
    }
}

impl LlmConfig {
    pub fn chat_from_args(args: &Args) -> Result<Self, ParseLlmTypeError> {
        Ok(Self {
            llm_type: args.chat_llm_type.parse()?,
            api_key: Some(args.chat_api_key.clone()).filter(|k| !k.is_empty()),
            completion_model: args.chat_model.clone(),
            base_url: args.chat_base_url.clone(),
            options: generation_options(args),
        })
    }

    /// Summary settings fall back field by field to the chat settings.
    pub fn summary_from_args(args: &Args) -> Result<Self, ParseLlmTypeError> {
        let llm_type_str = match &args.summary_llm_type {
            Some(s) if !s.trim().is_empty() => s.as_str(),
            _ => &args.chat_llm_type,
        };
        let api_key = args.summary_api_key.as_deref().unwrap_or(&args.chat_api_key);

        Ok(Self {
            llm_type: llm_type_str.parse()?,
            api_key: Some(api_key.to_string()).filter(|k| !k.is_empty()),
            completion_model: args.summary_model.clone().or_else(|| args.chat_model.clone()),
            base_url: args.summary_base_url.clone().or_else(|| args.chat_base_url.clone()),
            options: generation_options(args),
        })
    }
}

fn generation_options(args: &Args) -> GenerationOptions {
    GenerationOptions {
        temperature: args.temperature,
        top_k: args.top_k,
        top_p: args.top_p,
        repeat_penalty: args.repeat_penalty,
        num_ctx: args.num_ctx,
        max_tokens: args.max_tokens,
    }
}
