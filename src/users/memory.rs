use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{NewUser, User, UserChanges};
use super::repo::{DuplicateEmail, UserFilter, UserRepository};

/// Map-backed repository for tests. Counts writes so callers can assert
/// that an operation left the store untouched.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
    writes: AtomicUsize,
    fail_writes: bool,
    /// `exists_by_email` always answers false, as when a concurrent
    /// request claims the address between check and write.
    stale_email_checks: bool,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write fails, as a constraint violation would.
    pub fn failing_writes() -> Self {
        Self { fail_writes: true, ..Self::default() }
    }

    pub fn with_stale_email_checks() -> Self {
        Self { stale_email_checks: true, ..Self::default() }
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Inserts a fully formed record without counting it as a write.
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    fn begin_write(&self) -> anyhow::Result<()> {
        if self.fail_writes {
            anyhow::bail!("write rejected by store");
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn sorted(mut users: Vec<User>) -> Vec<User> {
    users.sort_by(|a, b| a.email.cmp(&b.email));
    users
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.values().find(|u| u.email == email).cloned())
    }

    async fn find_all(&self) -> anyhow::Result<Vec<User>> {
        Ok(sorted(self.users.read().await.values().cloned().collect()))
    }

    async fn find_where(&self, filter: &UserFilter) -> anyhow::Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(sorted(users.values().filter(|u| filter.matches(u)).cloned().collect()))
    }

    async fn exists_privileged(&self) -> anyhow::Result<bool> {
        Ok(self.users.read().await.values().any(|u| u.is_superuser))
    }

    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool> {
        if self.stale_email_checks {
            return Ok(false);
        }
        Ok(self.users.read().await.values().any(|u| u.email == email))
    }

    async fn count_where(&self, filter: &UserFilter) -> anyhow::Result<i64> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| filter.matches(u)).count() as i64)
    }

    async fn create(&self, new: NewUser) -> anyhow::Result<User> {
        self.begin_write()?;
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new.email) {
            return Err(DuplicateEmail(new.email).into());
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            username: new.username,
            first_name: new.first_name,
            last_name: new.last_name,
            cellphone: new.cellphone,
            job: new.job,
            family_role: new.family_role,
            password_hash: new.password_hash,
            is_staff: new.is_staff,
            is_superuser: new.is_superuser,
            is_active: new.is_active,
            date_joined: OffsetDateTime::now_utc(),
            last_login: None,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> anyhow::Result<Option<User>> {
        self.begin_write()?;
        let mut users = self.users.write().await;
        if let Some(email) = changes.email.as_deref() {
            if users.values().any(|u| u.id != id && u.email == email) {
                return Err(DuplicateEmail(email.to_string()).into());
            }
        }
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply_to(user);
        Ok(Some(user.clone()))
    }

    async fn record_login(&self, id: Uuid) -> anyhow::Result<()> {
        self.begin_write()?;
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.last_login = Some(OffsetDateTime::now_utc());
        }
        Ok(())
    }
}
