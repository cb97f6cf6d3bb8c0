use axum::extract::State;
use axum::http::StatusCode;

use crate::db;
use crate::models::profile::{ Profile, ProfileInput, SPECIALTY_MAX_LEN };
use crate::server::api::AppState;
use crate::server::auth::AuthUser;
use crate::server::error::{ ApiError, ApiResult };
use crate::server::extract::Json;

fn validate(input: &ProfileInput) -> ApiResult<()> {
    if let Some(specialty) = &input.specialty {
        if specialty.chars().count() > SPECIALTY_MAX_LEN {
            return Err(ApiError::BadRequest(
                format!("specialty: ensure this field has no more than {} characters.", SPECIALTY_MAX_LEN)
            ));
        }
    }
    Ok(())
}

/// Returns the caller's profile, creating an empty one on first access.
pub async fn get_about(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Profile>> {
    Ok(Json(db::profiles::get_or_create_empty(&state.db, user.id).await?))
}

pub async fn update_about(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<ProfileInput>,
) -> ApiResult<Json<Profile>> {
    validate(&input)?;
    Ok(Json(db::profiles::update(&state.db, user.id, &input).await?))
}

pub async fn create_about(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<ProfileInput>,
) -> ApiResult<(StatusCode, Json<Profile>)> {
    validate(&input)?;
    let profile = db::profiles::create(&state.db, user.id, &input).await?
        .ok_or_else(|| ApiError::BadRequest("About already exists.".into()))?;
    Ok((StatusCode::CREATED, Json(profile)))
}
