//! Fixtures shared by the unit tests.

use axum::{
    body::Body,
    extract::FromRef,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::jwt::JwtKeys;
use crate::state::AppState;
use crate::users::memory::InMemoryUserRepository;
use crate::users::model::{FamilyRole, User};

pub fn user_record(email: &str, role: FamilyRole) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        username: email.split('@').next().unwrap_or_default().to_string(),
        first_name: String::new(),
        last_name: String::new(),
        cellphone: None,
        job: None,
        family_role: role,
        password_hash: "!".into(),
        is_staff: false,
        is_superuser: false,
        is_active: true,
        date_joined: OffsetDateTime::now_utc(),
        last_login: None,
    }
}

pub struct SeedUser {
    pub user: User,
}

impl SeedUser {
    pub fn new(email: &str, role: FamilyRole) -> Self {
        Self { user: user_record(email, role) }
    }

    pub fn staff(mut self) -> Self {
        self.user.is_staff = true;
        self
    }

    pub fn superuser(mut self) -> Self {
        self.user.is_staff = true;
        self.user.is_superuser = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.user.is_active = false;
        self
    }

    pub fn joined(mut self, at: OffsetDateTime) -> Self {
        self.user.date_joined = at;
        self
    }
}

pub async fn seed_user(repo: &InMemoryUserRepository, seed: SeedUser) -> User {
    repo.insert(seed.user.clone()).await;
    seed.user
}

pub fn bearer(state: &AppState, user: &User) -> String {
    let token = JwtKeys::from_ref(state).sign_access(user.id).unwrap();
    format!("Bearer {token}")
}

/// Sends one request through the router and decodes the JSON body
/// (`Value::Null` for empty or non-JSON bodies).
pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
