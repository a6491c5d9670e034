use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use crate::{
    auth::password::hash_password,
    config::SuperuserConfig,
    users::{
        model::{NewUser, User},
        repo::UserRepository,
        validation::normalize_email,
    },
};

/// Result of one bootstrap run. Nothing here is a process failure.
#[derive(Debug)]
pub enum BootstrapOutcome {
    /// A superuser exists already; nothing written.
    AlreadyExists,
    /// The target email belongs to a regular account; it is left as is.
    EmailTaken(String),
    Created(User),
    /// Creation failed; the error has been logged.
    Failed(String),
}

/// Creates the first superuser when none exists.
pub struct SuperuserBootstrapper {
    users: Arc<dyn UserRepository>,
    config: SuperuserConfig,
}

impl SuperuserBootstrapper {
    pub fn new(users: Arc<dyn UserRepository>, config: SuperuserConfig) -> Self {
        Self { users, config }
    }

    pub async fn run(&self) -> BootstrapOutcome {
        match self.try_run().await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = format!("{e:#}");
                error!(error = %message, "error creating superuser");
                BootstrapOutcome::Failed(message)
            }
        }
    }

    async fn try_run(&self) -> anyhow::Result<BootstrapOutcome> {
        if self.users.exists_privileged().await? {
            info!("superuser already exists, skipping creation");
            return Ok(BootstrapOutcome::AlreadyExists);
        }

        info!("no superuser found, creating one");
        let email = normalize_email(&self.config.email);
        if self.users.exists_by_email(&email).await? {
            warn!(%email, "user with this email already exists, skipping creation");
            return Ok(BootstrapOutcome::EmailTaken(email));
        }

        let new = NewUser {
            email,
            username: SuperuserConfig::USERNAME.into(),
            first_name: SuperuserConfig::FIRST_NAME.into(),
            last_name: SuperuserConfig::LAST_NAME.into(),
            cellphone: None,
            job: None,
            family_role: SuperuserConfig::FAMILY_ROLE,
            password_hash: hash_password(&self.config.password)?,
            is_staff: true,
            is_superuser: true,
            is_active: true,
        };
        let user = self.users.create(new).await.context("create superuser")?;
        info!(user_id = %user.id, email = %user.email, "superuser created");
        Ok(BootstrapOutcome::Created(user))
    }
}
