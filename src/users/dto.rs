use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::{FamilyRole, User, UserChanges};
use super::validation::{
    clean_email, clean_name, clean_optional, clean_username, CELLPHONE_MAX_LEN, JOB_MAX_LEN,
};
use crate::error::ApiError;

/// User as returned by the API. The password hash never leaves the server.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub cellphone: Option<String>,
    pub job: Option<String>,
    pub family_role: FamilyRole,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub date_joined: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            first_name: u.first_name,
            last_name: u.last_name,
            cellphone: u.cellphone,
            job: u.job,
            family_role: u.family_role,
            is_staff: u.is_staff,
            is_superuser: u.is_superuser,
            is_active: u.is_active,
            date_joined: u.date_joined,
            last_login: u.last_login,
        }
    }
}

/// Self-edit body for `PUT`/`PATCH /users/:id`. Absent fields are left alone;
/// a blank `cellphone` or `job` clears it.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub cellphone: Option<String>,
    pub job: Option<String>,
    pub family_role: Option<FamilyRole>,
}

impl UpdateUserRequest {
    pub fn into_changes(self) -> Result<UserChanges, ApiError> {
        Ok(UserChanges {
            email: self.email.as_deref().map(clean_email).transpose()?,
            username: self.username.as_deref().map(clean_username).transpose()?,
            first_name: self
                .first_name
                .as_deref()
                .map(|v| clean_name("first_name", v))
                .transpose()?,
            last_name: self
                .last_name
                .as_deref()
                .map(|v| clean_name("last_name", v))
                .transpose()?,
            cellphone: self
                .cellphone
                .as_deref()
                .map(|v| clean_optional("cellphone", v, CELLPHONE_MAX_LEN))
                .transpose()?,
            job: self
                .job
                .as_deref()
                .map(|v| clean_optional("job", v, JOB_MAX_LEN))
                .transpose()?,
            family_role: self.family_role,
            ..Default::default()
        })
    }
}
