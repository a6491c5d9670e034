//! Start-up wait for the database.
//!
//! [`ReadinessProber::wait`] runs `SELECT 1` once per second until it
//! succeeds or the configured timeout has elapsed since the first attempt.
//! There is no backoff and no jitter. Each attempt is cut off so that a
//! failure is always reported within one poll interval of the timeout.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::{sleep, timeout, Instant};
use tracing::{error, info, warn};

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Upper bound on a single connectivity check.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// One connectivity check against the database.
#[async_trait]
pub trait Ping: Send + Sync {
    async fn ping(&self) -> Result<(), sqlx::Error>;
}

#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("database connection timeout after {} seconds ({attempts} attempts): {source}", .timeout.as_secs())]
    Timeout {
        timeout: Duration,
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },
}

pub struct ReadinessProber<P> {
    pinger: P,
    timeout: Duration,
    interval: Duration,
}

impl<P: Ping> ReadinessProber<P> {
    pub fn new(pinger: P, timeout: Duration) -> Self {
        Self {
            pinger,
            timeout,
            interval: POLL_INTERVAL,
        }
    }

    pub async fn wait(&self) -> Result<(), ReadinessError> {
        info!(timeout_secs = self.timeout.as_secs(), "waiting for database...");
        let started = Instant::now();
        let mut attempts = 0u32;

        let deadline = self.timeout + self.interval;
        loop {
            attempts += 1;
            let budget = deadline
                .saturating_sub(started.elapsed())
                .min(ATTEMPT_TIMEOUT);
            let outcome = match timeout(budget, self.pinger.ping()).await {
                Ok(result) => result,
                Err(_) => Err(sqlx::Error::PoolTimedOut),
            };
            match outcome {
                Ok(()) => {
                    info!(attempts, "database available");
                    return Ok(());
                }
                Err(e) => {
                    // Checked before sleeping so a zero timeout never waits.
                    if started.elapsed() >= self.timeout {
                        error!(
                            timeout_secs = self.timeout.as_secs(),
                            attempts,
                            error = %e,
                            "database connection timeout"
                        );
                        return Err(ReadinessError::Timeout {
                            timeout: self.timeout,
                            attempts,
                            source: e,
                        });
                    }
                    warn!(attempts, error = %e, "database unavailable, waiting 1 second...");
                    sleep(self.interval).await;
                }
            }
        }
    }
}
