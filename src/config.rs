use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

use crate::users::model::FamilyRole;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Account created by `init-superuser`.
#[derive(Debug, Clone, Deserialize)]
pub struct SuperuserConfig {
    pub email: String,
    pub password: String,
}

impl SuperuserConfig {
    pub const DEFAULT_EMAIL: &'static str = "admin@example.com";
    pub const DEFAULT_PASSWORD: &'static str = "admin";
    pub const USERNAME: &'static str = "admin";
    pub const FIRST_NAME: &'static str = "Admin";
    pub const LAST_NAME: &'static str = "System";
    pub const FAMILY_ROLE: FamilyRole = FamilyRole::Father;

    pub fn from_env() -> Self {
        Self {
            email: std::env::var("SUPERUSER_EMAIL")
                .unwrap_or_else(|_| Self::DEFAULT_EMAIL.into()),
            password: std::env::var("SUPERUSER_PASSWORD")
                .unwrap_or_else(|_| Self::DEFAULT_PASSWORD.into()),
        }
    }
}

impl Default for SuperuserConfig {
    fn default() -> Self {
        Self {
            email: Self::DEFAULT_EMAIL.into(),
            password: Self::DEFAULT_PASSWORD.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub server: ServerConfig,
    /// Deployment name, e.g. `production`, `staging`, `development`.
    pub environment: String,
}

/// Reads `key`, falling back to `default` when unset. A set but
/// unparsable value is an error.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_or(key, std::env::var(key).ok(), default)
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(v) => v
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value {v:?}")),
        None => Ok(default),
    }
}

pub fn database_url() -> anyhow::Result<String> {
    std::env::var("DATABASE_URL").context("DATABASE_URL must be set")
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = database_url()?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "familyhub".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "familyhub-users".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60)?,
            refresh_ttl_minutes: env_or("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14)?,
        };
        let server = ServerConfig {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("APP_PORT", 8080)?,
        };
        let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        Ok(Self {
            database_url,
            jwt,
            server,
            environment,
        })
    }
}
