use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dashboard::{DashboardContext, DashboardStats, EnvironmentBadge},
    layout::{AdminLayout, USER_ADMIN},
};
use crate::{
    auth::extractors::StaffUser,
    error::ApiError,
    extract::ApiJson,
    state::AppState,
    users::{
        dto::{UpdateUserRequest, UserResponse},
        handlers::ensure_email_available,
        model::{FamilyRole, UserChanges},
        repo::UserFilter,
    },
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/layout", get(layout))
        .route("/admin/dashboard", get(dashboard))
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id", patch(update_user))
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminUserQuery {
    pub q: Option<String>,
    pub family_role: Option<FamilyRole>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_active: Option<bool>,
}

impl From<AdminUserQuery> for UserFilter {
    fn from(q: AdminUserQuery) -> Self {
        UserFilter {
            is_active: q.is_active,
            is_staff: q.is_staff,
            is_superuser: q.is_superuser,
            family_role: q.family_role,
            joined_on: None,
            search: q.q,
        }
    }
}

/// Privileged edit: the self-edit fields plus the permission flags.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminUpdateUserRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub cellphone: Option<String>,
    pub job: Option<String>,
    pub family_role: Option<FamilyRole>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

impl AdminUpdateUserRequest {
    pub fn into_changes(self) -> Result<UserChanges, ApiError> {
        let profile = UpdateUserRequest {
            email: self.email,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            cellphone: self.cellphone,
            job: self.job,
            family_role: self.family_role,
        };
        Ok(UserChanges {
            is_active: self.is_active,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
            ..profile.into_changes()?
        })
    }
}

pub async fn layout(_staff: StaffUser) -> Json<&'static AdminLayout> {
    Json(&USER_ADMIN)
}

#[instrument(skip_all, fields(caller = %staff.0.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    staff: StaffUser,
) -> Result<Json<DashboardContext>, ApiError> {
    let today = OffsetDateTime::now_utc().date();
    let stats = DashboardStats::collect(state.users.as_ref(), today).await?;
    let badge = EnvironmentBadge::for_environment(&state.config.environment);
    Ok(Json(DashboardContext::new(badge, stats)))
}

#[instrument(skip(state, staff), fields(caller = %staff.0.id))]
pub async fn list_users(
    State(state): State<AppState>,
    staff: StaffUser,
    Query(query): Query<AdminUserQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.users.find_where(&UserFilter::from(query)).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip(state, staff, payload), fields(caller = %staff.0.id))]
pub async fn update_user(
    State(state): State<AppState>,
    staff: StaffUser,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<AdminUpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let current = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let changes = payload.into_changes()?;
    ensure_email_available(state.users.as_ref(), &current, changes.email.as_deref()).await?;

    let user = state
        .users
        .update(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    info!(
        user_id = %user.id,
        is_active = user.is_active,
        is_staff = user.is_staff,
        is_superuser = user.is_superuser,
        "user updated by staff"
    );
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        app::build_app,
        state::AppState,
        test_support::{bearer, get, json_request, seed_user, send, SeedUser},
        users::{memory::InMemoryUserRepository, model::FamilyRole, repo::UserRepository},
    };

    async fn family() -> (AppState, Arc<InMemoryUserRepository>, String, String) {
        let repo = Arc::new(InMemoryUserRepository::new());
        let dad = seed_user(&repo, SeedUser::new("dad@example.com", FamilyRole::Father).staff()).await;
        let kid = seed_user(&repo, SeedUser::new("kid@example.com", FamilyRole::Son)).await;
        seed_user(&repo, SeedUser::new("rex@example.com", FamilyRole::Pet).inactive()).await;
        let state = AppState::fake_with(repo.clone());
        let staff = bearer(&state, &dad);
        let regular = bearer(&state, &kid);
        (state, repo, staff, regular)
    }

    #[tokio::test]
    async fn admin_routes_require_staff() {
        let (state, _, _, regular) = family().await;
        for uri in ["/api/admin/layout", "/api/admin/dashboard", "/api/admin/users"] {
            let (status, _) = send(build_app(state.clone()), get(uri, Some(&regular))).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
            let (status, _) = send(build_app(state.clone()), get(uri, None)).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        }
    }

    #[tokio::test]
    async fn layout_lists_field_groups() {
        let (state, _, staff, _) = family().await;
        let (status, json) = send(build_app(state), get("/api/admin/layout", Some(&staff))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ordering"], json!(["email"]));
        assert_eq!(json["fieldsets"][2]["title"], "Family Info");
        assert_eq!(json["fieldsets"][2]["fields"], json!(["family_role"]));
    }

    #[tokio::test]
    async fn dashboard_reports_counts_and_badge() {
        let (state, _, staff, _) = family().await;
        let (status, json) = send(build_app(state), get("/api/admin/dashboard", Some(&staff))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["stats"]["total"], 3);
        assert_eq!(json["stats"]["active"], 2);
        assert_eq!(json["stats"]["staff"], 1);
        assert_eq!(json["kpi"][0]["metric"], 3);
        assert_eq!(json["kpi"][0]["footer"], "2 active • 1 staff");
        assert_eq!(json["environment"]["label"], "Development");
    }

    #[tokio::test]
    async fn user_list_filters_and_searches() {
        let (state, _, staff, _) = family().await;
        let app = || build_app(state.clone());

        let (_, json) = send(app(), get("/api/admin/users?is_active=false", Some(&staff))).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["email"], "rex@example.com");

        let (_, json) = send(app(), get("/api/admin/users?family_role=SON", Some(&staff))).await;
        assert_eq!(json[0]["email"], "kid@example.com");

        let (_, json) = send(app(), get("/api/admin/users?q=DAD", Some(&staff))).await;
        assert_eq!(json.as_array().unwrap().len(), 1);

        let (_, json) = send(app(), get("/api/admin/users", Some(&staff))).await;
        let emails: Vec<_> = json.as_array().unwrap().iter().map(|u| u["email"].clone()).collect();
        assert_eq!(emails, [json!("dad@example.com"), json!("kid@example.com"), json!("rex@example.com")]);
    }

    #[tokio::test]
    async fn staff_can_change_permission_flags() {
        let (state, repo, staff, _) = family().await;
        let kid = repo.find_by_email("kid@example.com").await.unwrap().unwrap();
        let uri = format!("/api/admin/users/{}", kid.id);
        let (status, json) = send(
            build_app(state),
            json_request("PATCH", &uri, Some(&staff), json!({ "is_staff": true, "is_active": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["is_staff"], true);
        assert_eq!(json["is_active"], false);
        let stored = repo.find_by_id(kid.id).await.unwrap().unwrap();
        assert!(stored.is_staff && !stored.is_active);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (state, _, staff, _) = family().await;
        let uri = format!("/api/admin/users/{}", uuid::Uuid::new_v4());
        let (status, _) = send(
            build_app(state),
            json_request("PATCH", &uri, Some(&staff), json!({ "job": "Chef" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
