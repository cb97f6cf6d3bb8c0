use crate::agent::Assistant;
use crate::cli::Args;
use super::auth::AuthSettings;
use super::error::ApiError;
use super::routes;
use std::error::Error;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use axum::{
    routing::{ get, post },
    Router,
};
use governor::{ DefaultKeyedRateLimiter, Quota, RateLimiter };
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use log::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub assistant: Arc<Assistant>,
    pub auth: Arc<AuthSettings>,
    pub limiter: Option<Arc<DefaultKeyedRateLimiter<String>>>,
    pub max_plans_per_user: usize,
}

impl AppState {
    pub fn new(args: &Args, db: SqlitePool, assistant: Arc<Assistant>) -> Self {
        let limiter = NonZeroU32::new(args.assistant_rate_per_minute)
            .map(|rate| Arc::new(RateLimiter::keyed(Quota::per_minute(rate))));

        Self {
            db,
            assistant,
            auth: Arc::new(AuthSettings::from_args(args)),
            limiter,
            max_plans_per_user: args.max_plans_per_user,
        }
    }

    /// Charges one assistant call to `username`.
    pub fn check_rate(&self, username: &str) -> Result<(), ApiError> {
        if let Some(limiter) = &self.limiter {
            if limiter.check_key(&username.to_string()).is_err() {
                warn!("Assistant rate limit exceeded for @{}", username);
                return Err(ApiError::TooManyRequests);
            }
        }
        Ok(())
    }
}

pub fn router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route(
            "/about",
            get(routes::profile::get_about)
                .put(routes::profile::update_about)
                .patch(routes::profile::update_about)
        )
        .route("/about/create", post(routes::profile::create_about))
        .route("/chats", get(routes::chats::list_chats).post(routes::chats::create_chat))
        .route(
            "/chats/{id}",
            get(routes::chats::get_chat)
                .put(routes::chats::update_chat)
                .patch(routes::chats::update_chat)
                .delete(routes::chats::delete_chat)
        )
        .route("/chats/{id}/assistant", post(routes::assistant::chat_with_assistant))
        .route("/chat/respond", post(routes::assistant::respond))
        .route("/messages", get(routes::messages::list_messages).post(routes::messages::create_message))
        .route(
            "/messages/{id}",
            get(routes::messages::get_message)
                .put(routes::messages::update_message)
                .patch(routes::messages::update_message)
                .delete(routes::messages::delete_message)
        )
        .route("/plans", get(routes::plans::list_plans).post(routes::plans::create_plan))
        .route(
            "/plans/{id}",
            get(routes::plans::get_plan)
                .put(routes::plans::update_plan)
                .patch(routes::plans::update_plan)
                .delete(routes::plans::delete_plan)
        )
        .route("/reload-prompts", get(routes::prompts::reload_prompts));

    Router::new()
        .nest("/api", api)
        .layer(cors)
        .with_state(app_state)
}

pub async fn start_http_server(
    addr: &str,
    app_state: AppState,
    args: &Args,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;
    let app = router(app_state);

    if args.enable_tls {
        let (cert_path, key_path) = match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert_path), Some(key_path)) => (cert_path, key_path),
            _ => return Err("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.".into()),
        };
        info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        info!("Starting HTTPS API server on: https://{}", addr);
        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await?;
    } else {
        info!("Starting HTTP API server on: http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await
            .map_err(|e| format!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e))?;
        axum::serve(listener, app.into_make_service()).await?;
    }

    Ok(())
}
