use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::domain::session::errors::SessionError;
use crate::domain::session::ports::SessionRepository;

/// Periodically purges expired sessions until shutdown is signalled.
pub struct SessionSweeper<SR>
where
    SR: SessionRepository,
{
    sessions: Arc<SR>,
    interval: Duration,
}

impl<SR> SessionSweeper<SR>
where
    SR: SessionRepository,
{
    pub fn new(sessions: Arc<SR>, interval: Duration) -> Self {
        Self { sessions, interval }
    }

    /// Delete every session expired as of now.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    pub async fn sweep_once(&self) -> Result<u64, SessionError> {
        let purged = self.sessions.delete_expired(Utc::now()).await?;
        if purged > 0 {
            tracing::info!(purged, "Expired sessions purged");
        } else {
            tracing::debug!("No expired sessions to purge");
        }
        Ok(purged)
    }

    /// Sweep on every tick until `shutdown` turns true or its sender is dropped.
    ///
    /// The first sweep runs immediately. Failures are logged and retried on
    /// the next tick.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Session sweeper started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        tracing::error!(error = %e, "Session sweep failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Session sweeper stopped");
    }
}
