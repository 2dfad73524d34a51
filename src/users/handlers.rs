use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::{
    auth::{dto::PublicUser, extractors::CurrentUser, guard::require_role},
    error::ApiError,
    state::AppState,
    users::model::Role,
    users::store::UserStore as _,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(get_me))
        .route("/deleteMe", delete(delete_me))
}

#[instrument(skip(user))]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(json!({
        "status": "success",
        "data": { "user": PublicUser::from(&user) },
    }))
}

/// Soft delete: the record stays, but every lookup stops seeing it.
#[instrument(skip(state, user))]
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, ApiError> {
    state
        .users
        .deactivate(user.id)
        .await
        .map_err(|e| ApiError::from_store(e, state.config.environment))?;
    info!(user_id = %user.id, "account deactivated");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, user))]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Admin])?;
    let users = state
        .users
        .list()
        .await
        .map_err(|e| ApiError::from_store(e, state.config.environment))?;
    let users: Vec<PublicUser> = users.iter().map(PublicUser::from).collect();
    Ok(Json(json!({
        "status": "success",
        "results": users.len(),
        "data": { "users": users },
    })))
}
