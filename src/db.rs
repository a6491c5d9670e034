use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnection, PgPoolOptions},
    Connection, PgPool,
};

use crate::readiness::Ping;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool that connects on first use, so commands can report connection
/// failures themselves.
pub fn lazy_pool(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect_lazy(database_url)
        .context("parse DATABASE_URL")
}

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")
}

/// Opens a fresh connection per attempt and runs `SELECT 1`. The prober
/// bounds how long an attempt may take.
pub struct PgPing {
    database_url: String,
}

impl PgPing {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }
}

#[async_trait]
impl Ping for PgPing {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        let mut conn = PgConnection::connect(&self.database_url).await?;
        sqlx::query("SELECT 1").execute(&mut conn).await?;
        conn.close().await
    }
}
