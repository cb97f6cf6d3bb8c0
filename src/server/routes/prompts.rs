use axum::{ extract::State, http::StatusCode, response::IntoResponse, Json };
use serde::Serialize;

use crate::server::api::AppState;
use crate::server::auth::AuthUser;

#[derive(Serialize)]
struct ReloadResponse {
    success: bool,
    message: String,
    details: Vec<String>,
}

pub async fn reload_prompts(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> impl IntoResponse {
    let (ok, detail) = match state.assistant.reload_prompts_if_changed().await {
        Ok(true) => (true, "Prompts reloaded".to_string()),
        Ok(false) => (true, "Prompts unchanged".to_string()),
        Err(e) => (false, format!("Prompts error: {}", e)),
    };

    let code = if ok { StatusCode::OK } else { StatusCode::BAD_REQUEST };
    (code, Json(ReloadResponse {
        success: ok,
        message: if ok { "Reload complete".into() } else { "Reload errors".into() },
        details: vec![detail],
    }))
}
