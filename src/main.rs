use std::{sync::Arc, time::Duration};

use clap::Parser;

mod admin;
mod app;
mod auth;
mod bootstrap;
mod cli;
mod config;
mod db;
mod error;
mod extract;
mod readiness;
mod state;
#[cfg(test)]
mod test_support;
mod users;

use crate::{
    bootstrap::{BootstrapOutcome, SuperuserBootstrapper},
    cli::{Cli, Commands},
    config::SuperuserConfig,
    readiness::ReadinessProber,
    state::AppState,
    users::repo::{PgUserRepository, UserRepository},
};

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "familyhub=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let app_state = AppState::init().await?;
            let server = app_state.config.server.clone();
            app::serve(app::build_app(app_state), &server).await
        }
        Commands::WaitForDb { timeout } => {
            let database_url = config::database_url()?;
            let prober = ReadinessProber::new(
                db::PgPing::new(database_url),
                Duration::from_secs(timeout),
            );
            prober.wait().await?;
            Ok(())
        }
        Commands::InitSuperuser => {
            init_superuser().await;
            Ok(())
        }
    }
}

/// Never fails the process; problems are logged.
async fn init_superuser() {
    let users = match config::database_url().and_then(|url| db::lazy_pool(&url)) {
        Ok(pool) => Arc::new(PgUserRepository::new(pool)) as Arc<dyn UserRepository>,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "error creating superuser");
            return;
        }
    };

    let config = SuperuserConfig::from_env();
    match SuperuserBootstrapper::new(users, config).run().await {
        BootstrapOutcome::Created(user) => {
            tracing::info!(email = %user.email, "superuser ready")
        }
        BootstrapOutcome::AlreadyExists
        | BootstrapOutcome::EmailTaken(_)
        | BootstrapOutcome::Failed(_) => {}
    }
}
