use clap::{Parser, Subcommand};

use crate::readiness::DEFAULT_TIMEOUT_SECS;

#[derive(Debug, Parser)]
#[command(name = "familyhub")]
#[command(about = "Family finance hub: user service and management commands")]
#[command(version)]
pub struct Cli {
    /// Defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Run migrations and start the HTTP server
    Serve,
    /// Block until the database accepts queries
    WaitForDb {
        /// Maximum time to wait for the database (seconds)
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,
    },
    /// Create a superuser if none exists
    InitSuperuser,
}
