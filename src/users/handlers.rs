use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{UpdateUserRequest, UserResponse},
    model::User,
    repo::UserRepository,
    scope::{visible_user, visible_users},
};
use crate::{
    auth::extractors::CurrentUser, error::ApiError, extract::ApiJson, state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).patch(update_user),
        )
}

#[instrument(skip_all, fields(caller = %caller.user.id, scope = ?caller.scope))]
pub async fn list_users(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = visible_users(state.users.as_ref(), caller.scope).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip(state, caller), fields(caller = %caller.user.id))]
pub async fn get_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = visible_user(state.users.as_ref(), caller.scope, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, caller, payload), fields(caller = %caller.user.id))]
pub async fn update_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let current = visible_user(state.users.as_ref(), caller.scope, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let changes = payload.into_changes()?;
    ensure_email_available(state.users.as_ref(), &current, changes.email.as_deref()).await?;

    let user = state
        .users
        .update(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    info!(user_id = %user.id, "user updated");
    Ok(Json(user.into()))
}

/// Rejects an email change onto an address another account already holds.
pub(crate) async fn ensure_email_available(
    users: &dyn UserRepository,
    current: &User,
    new_email: Option<&str>,
) -> Result<(), ApiError> {
    match new_email {
        Some(email) if email != current.email => {
            if users.exists_by_email(email).await? {
                warn!(%email, "email already registered");
                return Err(ApiError::Conflict("Email already registered".into()));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
