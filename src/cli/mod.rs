use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Database Args ---
    /// SQLite connection string (e.g., sqlite://gameplan.db or sqlite::memory:)
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://gameplan.db")]
    pub database_url: String,

    /// Maximum number of pooled database connections.
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value = "8")]
    pub db_max_connections: u32,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (ollama, openai)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "ollama")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider (required by OpenAI)
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., llama3.2:3b, gpt-4o)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    // --- Summary LLM Provider Args (Optional) ---
    /// Type of LLM provider for conversation summaries. Defaults to CHAT_LLM_TYPE if not set.
    #[arg(long, env = "SUMMARY_LLM_TYPE")]
    pub summary_llm_type: Option<String>,

    /// Base URL for the summary provider API. Defaults to CHAT_BASE_URL if not set.
    #[arg(long, env = "SUMMARY_BASE_URL")]
    pub summary_base_url: Option<String>,

    /// API Key for the summary provider. Defaults to CHAT_API_KEY if not set.
    #[arg(long, env = "SUMMARY_API_KEY")]
    pub summary_api_key: Option<String>,

    /// Model name for summaries. Defaults to CHAT_MODEL if not set.
    #[arg(long, env = "SUMMARY_MODEL")]
    pub summary_model: Option<String>,

    // --- Generation Options ---
    #[arg(long, env = "LLM_TEMPERATURE", default_value = "0.7")]
    pub temperature: f32,

    #[arg(long, env = "LLM_TOP_K", default_value = "40")]
    pub top_k: u32,

    #[arg(long, env = "LLM_TOP_P", default_value = "0.9")]
    pub top_p: f32,

    #[arg(long, env = "LLM_REPEAT_PENALTY", default_value = "1.1")]
    pub repeat_penalty: f32,

    /// Context window size passed to providers that accept it (Ollama).
    #[arg(long, env = "LLM_NUM_CTX", default_value = "4096")]
    pub num_ctx: u32,

    #[arg(long, env = "LLM_MAX_TOKENS", default_value = "2048")]
    pub max_tokens: u32,

    // --- Assistant Args ---
    /// Path to the prompt configuration file. Built-in prompts are used when the file is absent.
    #[arg(long, env = "PROMPTS_PATH", default_value = "json/prompts.json")]
    pub prompts_path: String,

    /// Number of most recent turns replayed into the prompt. 0 replays the whole conversation.
    #[arg(long, env = "HISTORY_LIMIT", default_value = "0")]
    pub history_limit: usize,

    /// Username of the account the assistant speaks as.
    #[arg(long, env = "ASSISTANT_USERNAME", default_value = "chatbot")]
    pub assistant_username: String,

    /// Per-user assistant requests allowed per minute. 0 disables the limit.
    #[arg(long, env = "ASSISTANT_RATE_PER_MINUTE", default_value = "20")]
    pub assistant_rate_per_minute: u32,

    /// Plans a single user may own. 0 means unlimited.
    #[arg(long, env = "MAX_PLANS_PER_USER", default_value = "10")]
    pub max_plans_per_user: usize,

    // --- Server Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:8000")]
    pub server_addr: String,

    /// Optional shared secret. If set, requests must carry X-Api-Ts and X-Api-Sign headers.
    #[arg(long, env = "SERVER_API_KEY")]
    pub server_api_key: Option<String>,

    /// Accepted clock skew in seconds for signed requests.
    #[arg(long, env = "SIGNATURE_MAX_SKEW_SECS", default_value = "300")]
    pub signature_max_skew_secs: i64,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}
