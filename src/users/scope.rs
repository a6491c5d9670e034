use uuid::Uuid;

use super::model::User;
use super::repo::UserRepository;

/// Which user records a caller may see. Resolved once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    /// Staff: every record.
    Full,
    /// Everyone else: only their own record.
    SelfOnly(Uuid),
}

impl AccessScope {
    pub fn for_user(user: &User) -> Self {
        if user.is_staff {
            AccessScope::Full
        } else {
            AccessScope::SelfOnly(user.id)
        }
    }

    pub fn permits(self, id: Uuid) -> bool {
        match self {
            AccessScope::Full => true,
            AccessScope::SelfOnly(own) => own == id,
        }
    }
}

/// Records visible under `scope`.
pub async fn visible_users(
    users: &dyn UserRepository,
    scope: AccessScope,
) -> anyhow::Result<Vec<User>> {
    match scope {
        AccessScope::Full => users.find_all().await,
        AccessScope::SelfOnly(id) => Ok(users.find_by_id(id).await?.into_iter().collect()),
    }
}

/// The record with `id`, or `None` when it does not exist or lies outside
/// `scope`.
pub async fn visible_user(
    users: &dyn UserRepository,
    scope: AccessScope,
    id: Uuid,
) -> anyhow::Result<Option<User>> {
    if !scope.permits(id) {
        return Ok(None);
    }
    users.find_by_id(id).await
}
