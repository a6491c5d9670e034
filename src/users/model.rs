use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Relationship of a user within the family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FamilyRole {
    Father,
    Mother,
    Son,
    Daughter,
    Grandfather,
    Grandmother,
    Uncle,
    Aunt,
    #[default]
    Friend,
    Pet,
}

impl FamilyRole {
    pub const ALL: [FamilyRole; 10] = [
        FamilyRole::Father,
        FamilyRole::Mother,
        FamilyRole::Son,
        FamilyRole::Daughter,
        FamilyRole::Grandfather,
        FamilyRole::Grandmother,
        FamilyRole::Uncle,
        FamilyRole::Aunt,
        FamilyRole::Friend,
        FamilyRole::Pet,
    ];

    /// Stored (and serialized) form.
    pub fn as_str(self) -> &'static str {
        match self {
            FamilyRole::Father => "FATHER",
            FamilyRole::Mother => "MOTHER",
            FamilyRole::Son => "SON",
            FamilyRole::Daughter => "DAUGHTER",
            FamilyRole::Grandfather => "GRANDFATHER",
            FamilyRole::Grandmother => "GRANDMOTHER",
            FamilyRole::Uncle => "UNCLE",
            FamilyRole::Aunt => "AUNT",
            FamilyRole::Friend => "FRIEND",
            FamilyRole::Pet => "PET",
        }
    }

    /// Human readable label shown in the admin.
    pub fn label(self) -> &'static str {
        match self {
            FamilyRole::Father => "Father",
            FamilyRole::Mother => "Mother",
            FamilyRole::Son => "Son",
            FamilyRole::Daughter => "Daughter",
            FamilyRole::Grandfather => "Grandfather",
            FamilyRole::Grandmother => "Grandmother",
            FamilyRole::Uncle => "Uncle",
            FamilyRole::Aunt => "Aunt",
            FamilyRole::Friend => "Friend",
            FamilyRole::Pet => "Pet",
        }
    }
}

impl fmt::Display for FamilyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown family role: {0}")]
pub struct UnknownFamilyRole(pub String);

impl FromStr for FamilyRole {
    type Err = UnknownFamilyRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FamilyRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownFamilyRole(s.to_string()))
    }
}

/// User account. The email is the login key.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub cellphone: Option<String>,
    pub job: Option<String>,
    pub family_role: FamilyRole,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: OffsetDateTime,
    pub last_login: Option<OffsetDateTime>,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.email)
    }
}

/// Fields needed to insert a user; the store assigns id and join date.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub cellphone: Option<String>,
    pub job: Option<String>,
    pub family_role: FamilyRole,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
}

impl NewUser {
    /// Active, non-privileged account.
    pub fn regular(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let email = email.into();
        let username = email.split('@').next().unwrap_or_default().to_string();
        Self {
            email,
            username,
            first_name: String::new(),
            last_name: String::new(),
            cellphone: None,
            job: None,
            family_role: FamilyRole::default(),
            password_hash: password_hash.into(),
            is_staff: false,
            is_superuser: false,
            is_active: true,
        }
    }
}

/// Partial update. `None` leaves a field untouched; for the optional
/// profile fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub cellphone: Option<Option<String>>,
    pub job: Option<Option<String>>,
    pub family_role: Option<FamilyRole>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_active: Option<bool>,
}

impl UserChanges {
    pub fn apply_to(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(cellphone) = self.cellphone {
            user.cellphone = cellphone;
        }
        if let Some(job) = self.job {
            user.job = job;
        }
        if let Some(role) = self.family_role {
            user.family_role = role;
        }
        if let Some(v) = self.is_staff {
            user.is_staff = v;
        }
        if let Some(v) = self.is_superuser {
            user.is_superuser = v;
        }
        if let Some(v) = self.is_active {
            user.is_active = v;
        }
    }
}
