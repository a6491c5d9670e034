use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::{FamilyRole, UnknownFamilyRole, User};

/// Row of the `users` table as stored.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub cellphone: Option<String>,
    pub job: Option<String>,
    pub family_role: String,        // one of FamilyRole::as_str
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: OffsetDateTime,
    pub last_login: Option<OffsetDateTime>,
}

pub const USER_COLUMNS: &str = "id, email, username, first_name, last_name, cellphone, job, \
     family_role, password_hash, is_staff, is_superuser, is_active, date_joined, last_login";

impl TryFrom<UserRow> for User {
    type Error = UnknownFamilyRole;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            email: r.email,
            username: r.username,
            first_name: r.first_name,
            last_name: r.last_name,
            cellphone: r.cellphone,
            job: r.job,
            family_role: r.family_role.parse::<FamilyRole>()?,
            password_hash: r.password_hash,
            is_staff: r.is_staff,
            is_superuser: r.is_superuser,
            is_active: r.is_active,
            date_joined: r.date_joined,
            last_login: r.last_login,
        })
    }
}
