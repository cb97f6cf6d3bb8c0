use axum::extract::State;
use axum::http::StatusCode;
use log::info;

use crate::db;
use crate::models::plan::{ NewPlan, Plan, PlanRange, PlanUpdate, TITLE_MAX_LEN };
use crate::server::api::AppState;
use crate::server::auth::AuthUser;
use crate::server::error::{ ApiError, ApiResult };
use crate::server::extract::{ Json, Path, Query };

fn clean_title(title: &str) -> ApiResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("title: this field may not be blank.".into()));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(ApiError::BadRequest(
            format!("title: ensure this field has no more than {} characters.", TITLE_MAX_LEN)
        ));
    }
    Ok(title.to_string())
}

async fn load_plan(state: &AppState, plan_id: i64, user_id: i64) -> ApiResult<Plan> {
    db::plans::get_for_user(&state.db, plan_id, user_id).await?
        .ok_or_else(|| ApiError::not_found("Plan"))
}

pub async fn list_plans(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(range): Query<PlanRange>,
) -> ApiResult<Json<Vec<Plan>>> {
    Ok(Json(db::plans::list_for_user(&state.db, user.id, &range).await?))
}

pub async fn create_plan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(mut body): Json<NewPlan>,
) -> ApiResult<(StatusCode, Json<Plan>)> {
    if state.max_plans_per_user > 0 {
        let existing = db::plans::count_for_user(&state.db, user.id).await?;
        if existing >= state.max_plans_per_user as i64 {
            return Err(ApiError::Forbidden(
                format!("You can only have {} plans.", state.max_plans_per_user)
            ));
        }
    }
    body.title = clean_title(&body.title)?;

    let plan = db::plans::create(&state.db, user.id, &body).await?;
    info!("Plan {} created by @{} with chat {:?}", plan.id, user.username, plan.chat_id);
    Ok((StatusCode::CREATED, Json(plan)))
}

pub async fn get_plan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(plan_id): Path<i64>,
) -> ApiResult<Json<Plan>> {
    Ok(Json(load_plan(&state, plan_id, user.id).await?))
}

pub async fn update_plan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(plan_id): Path<i64>,
    Json(mut changes): Json<PlanUpdate>,
) -> ApiResult<Json<Plan>> {
    let current = load_plan(&state, plan_id, user.id).await?;
    if let Some(title) = &changes.title {
        changes.title = Some(clean_title(title)?);
    }
    Ok(Json(db::plans::update(&state.db, current, changes).await?))
}

pub async fn delete_plan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(plan_id): Path<i64>,
) -> ApiResult<StatusCode> {
    load_plan(&state, plan_id, user.id).await?;
    db::plans::delete(&state.db, plan_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
