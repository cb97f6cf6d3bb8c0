pub mod agent;
pub mod cli;
pub mod config;
pub mod db;
pub mod history;
pub mod llm;
pub mod models;
pub mod server;

use agent::Assistant;
use cli::Args;
use log::info;
use server::api::AppState;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Database URL: {}", args.database_url);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!(
        "Summary LLM Type: {}",
        args.summary_llm_type.as_deref().unwrap_or(args.chat_llm_type.as_str())
    );
    info!("Prompts Path: {}", args.prompts_path);
    info!("History Limit: {}", if args.history_limit == 0 { "all".to_string() } else { args.history_limit.to_string() });
    info!("Assistant Username: {}", args.assistant_username);
    info!("Assistant Rate Per Minute: {}", args.assistant_rate_per_minute);
    info!("Max Plans Per User: {}", args.max_plans_per_user);
    info!("Request Signing: {}", if args.server_api_key.as_deref().is_some_and(|k| !k.is_empty()) { "on" } else { "off" });
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let pool = db::connect(&args.database_url, args.db_max_connections).await?;
    let assistant = Arc::new(Assistant::new(&args, pool.clone()).await?);
    let state = AppState::new(&args, pool, assistant);

    let server = Server::new(args.server_addr.clone(), state, args.clone());
    server.run().await?;

    Ok(())
}
