use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
};
use crate::{
    error::ApiError,
    extract::ApiJson,
    state::AppState,
    users::{
        model::{NewUser, User},
        validation::{
            clean_email, clean_name, clean_optional, clean_username, normalize_email,
            CELLPHONE_MAX_LEN, JOB_MAX_LEN, PASSWORD_MIN_LEN,
        },
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

fn issue_tokens(keys: &JwtKeys, user: User) -> Result<AuthResponse, ApiError> {
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".into())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = clean_email(&payload.email)?;

    if payload.password.chars().count() < PASSWORD_MIN_LEN {
        warn!("password too short");
        return Err(ApiError::validation("password", "Password too short"));
    }

    let mut new = NewUser::regular(email, String::new());
    if let Some(username) = payload.username.as_deref() {
        new.username = clean_username(username)?;
    }
    if let Some(first_name) = payload.first_name.as_deref() {
        new.first_name = clean_name("first_name", first_name)?;
    }
    if let Some(last_name) = payload.last_name.as_deref() {
        new.last_name = clean_name("last_name", last_name)?;
    }
    if let Some(cellphone) = payload.cellphone.as_deref() {
        new.cellphone = clean_optional("cellphone", cellphone, CELLPHONE_MAX_LEN)?;
    }
    if let Some(job) = payload.job.as_deref() {
        new.job = clean_optional("job", job, JOB_MAX_LEN)?;
    }
    if let Some(role) = payload.family_role {
        new.family_role = role;
    }

    if state.users.exists_by_email(&new.email).await? {
        warn!(email = %new.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    new.password_hash = hash_password(&payload.password)?;
    let user = state.users.create(new).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(issue_tokens(&keys, user)?))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = normalize_email(&payload.email);

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(invalid_credentials());
    };

    let ok = verify_password(&payload.password, &user.password_hash).unwrap_or_else(|e| {
        warn!(user_id = %user.id, error = %e, "stored password hash unusable");
        false
    });
    if !ok {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(invalid_credentials());
    }
    if !user.is_active {
        warn!(user_id = %user.id, "login inactive user");
        return Err(invalid_credentials());
    }

    state.users.record_login(user.id).await?;
    let user = state.users.find_by_id(user.id).await?.unwrap_or(user);

    info!(user_id = %user.id, email = %user.email, "user logged in");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(issue_tokens(&keys, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    Ok(Json(issue_tokens(&keys, user)?))
}
