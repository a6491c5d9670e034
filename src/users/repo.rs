use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;
use time::{Date, UtcOffset};
use uuid::Uuid;

use super::model::{FamilyRole, NewUser, User, UserChanges};
use super::repo_types::{UserRow, USER_COLUMNS};

/// A write hit the unique email constraint.
#[derive(Debug, Error)]
#[error("email {0} is already registered")]
pub struct DuplicateEmail(pub String);

/// Maps a unique violation on a write carrying `email` to [`DuplicateEmail`].
fn write_error(err: sqlx::Error, email: Option<&str>, action: String) -> anyhow::Error {
    match (email, err.as_database_error()) {
        (Some(email), Some(db)) if db.is_unique_violation() => {
            DuplicateEmail(email.to_string()).into()
        }
        _ => anyhow::Error::new(err).context(action),
    }
}

/// Predicate over users. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub family_role: Option<FamilyRole>,
    /// Calendar date (UTC) of `date_joined`.
    pub joined_on: Option<Date>,
    /// Case-insensitive substring of email, username, first or last name.
    pub search: Option<String>,
}

impl UserFilter {
    pub fn active() -> Self {
        Self { is_active: Some(true), ..Default::default() }
    }

    pub fn staff() -> Self {
        Self { is_staff: Some(true), ..Default::default() }
    }

    pub fn joined_on(date: Date) -> Self {
        Self { joined_on: Some(date), ..Default::default() }
    }

    pub fn matches(&self, user: &User) -> bool {
        if self.is_active.is_some_and(|v| v != user.is_active)
            || self.is_staff.is_some_and(|v| v != user.is_staff)
            || self.is_superuser.is_some_and(|v| v != user.is_superuser)
            || self.family_role.is_some_and(|r| r != user.family_role)
        {
            return false;
        }
        if let Some(date) = self.joined_on {
            if user.date_joined.to_offset(UtcOffset::UTC).date() != date {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let q = q.to_lowercase();
                [&user.email, &user.username, &user.first_name, &user.last_name]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&q))
            }
            _ => true,
        }
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");
        if let Some(v) = self.is_active {
            qb.push(" AND is_active = ").push_bind(v);
        }
        if let Some(v) = self.is_staff {
            qb.push(" AND is_staff = ").push_bind(v);
        }
        if let Some(v) = self.is_superuser {
            qb.push(" AND is_superuser = ").push_bind(v);
        }
        if let Some(role) = self.family_role {
            qb.push(" AND family_role = ").push_bind(role.as_str());
        }
        if let Some(date) = self.joined_on {
            qb.push(" AND (date_joined AT TIME ZONE 'UTC')::date = ")
                .push_bind(date);
        }
        if let Some(q) = self.search.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", escape_like(q));
            qb.push(" AND (");
            for (i, column) in ["email", "username", "first_name", "last_name"].iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(*column).push(" ILIKE ").push_bind(pattern.clone());
            }
            qb.push(")");
        }
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// Storage interface for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// All users ordered by email.
    async fn find_all(&self) -> anyhow::Result<Vec<User>>;
    /// Users matching `filter`, ordered by email.
    async fn find_where(&self, filter: &UserFilter) -> anyhow::Result<Vec<User>>;
    /// Whether any superuser account exists.
    async fn exists_privileged(&self) -> anyhow::Result<bool>;
    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool>;
    async fn count_where(&self, filter: &UserFilter) -> anyhow::Result<i64>;
    async fn create(&self, new: NewUser) -> anyhow::Result<User>;
    /// Returns `None` when no user has that id.
    async fn update(&self, id: Uuid, changes: UserChanges) -> anyhow::Result<Option<User>>;
    async fn record_login(&self, id: Uuid) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_users(rows: Vec<UserRow>) -> anyhow::Result<Vec<User>> {
    rows.into_iter()
        .map(|r| User::try_from(r).map_err(anyhow::Error::from))
        .collect()
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn find_all(&self) -> anyhow::Result<Vec<User>> {
        self.find_where(&UserFilter::default()).await
    }

    async fn find_where(&self, filter: &UserFilter) -> anyhow::Result<Vec<User>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users"));
        filter.push_where(&mut qb);
        qb.push(" ORDER BY email");
        let rows = qb
            .build_query_as::<UserRow>()
            .fetch_all(&self.db)
            .await
            .context("list users")?;
        into_users(rows)
    }

    async fn exists_privileged(&self) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE is_superuser)",
        )
        .fetch_one(&self.db)
        .await
        .context("check superuser exists")?;
        Ok(exists)
    }

    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.db)
        .await
        .context("check email exists")?;
        Ok(exists)
    }

    async fn count_where(&self, filter: &UserFilter) -> anyhow::Result<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        filter.push_where(&mut qb);
        let (count,) = qb
            .build_query_as::<(i64,)>()
            .fetch_one(&self.db)
            .await
            .context("count users")?;
        Ok(count)
    }

    async fn create(&self, new: NewUser) -> anyhow::Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, username, first_name, last_name, cellphone, job,
                               family_role, password_hash, is_staff, is_superuser, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.username)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.cellphone)
        .bind(&new.job)
        .bind(new.family_role.as_str())
        .bind(&new.password_hash)
        .bind(new.is_staff)
        .bind(new.is_superuser)
        .bind(new.is_active)
        .fetch_one(&self.db)
        .await
        .map_err(|e| write_error(e, Some(&new.email), format!("insert user {}", new.email)))?;
        Ok(User::try_from(row)?)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> anyhow::Result<Option<User>> {
        let new_email = changes.email.clone();
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET ");
        let mut touched = false;
        {
            let mut set = qb.separated(", ");
            if let Some(email) = changes.email {
                set.push("email = ").push_bind_unseparated(email);
                touched = true;
            }
            if let Some(username) = changes.username {
                set.push("username = ").push_bind_unseparated(username);
                touched = true;
            }
            if let Some(first_name) = changes.first_name {
                set.push("first_name = ").push_bind_unseparated(first_name);
                touched = true;
            }
            if let Some(last_name) = changes.last_name {
                set.push("last_name = ").push_bind_unseparated(last_name);
                touched = true;
            }
            if let Some(cellphone) = changes.cellphone {
                set.push("cellphone = ").push_bind_unseparated(cellphone);
                touched = true;
            }
            if let Some(job) = changes.job {
                set.push("job = ").push_bind_unseparated(job);
                touched = true;
            }
            if let Some(role) = changes.family_role {
                set.push("family_role = ").push_bind_unseparated(role.as_str());
                touched = true;
            }
            if let Some(v) = changes.is_staff {
                set.push("is_staff = ").push_bind_unseparated(v);
                touched = true;
            }
            if let Some(v) = changes.is_superuser {
                set.push("is_superuser = ").push_bind_unseparated(v);
                touched = true;
            }
            if let Some(v) = changes.is_active {
                set.push("is_active = ").push_bind_unseparated(v);
                touched = true;
            }
        }
        if !touched {
            return self.find_by_id(id).await;
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(USER_COLUMNS);
        let row = qb
            .build_query_as::<UserRow>()
            .fetch_optional(&self.db)
            .await
            .map_err(|e| write_error(e, new_email.as_deref(), format!("update user {id}")))?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn record_login(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET last_login = now() WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("record login")?;
        Ok(())
    }
}
