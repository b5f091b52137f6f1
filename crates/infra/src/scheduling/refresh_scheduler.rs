//! Periodic session refresh scheduler.
//!
//! Runs the authenticate + login cycle on a fixed interval in a background
//! task so the session never outlives its token during long enrichment runs.
//! A failed refresh is logged and retried on the next tick; the previously
//! published session stays in place, so in-flight queries keep working until
//! the token actually expires.
//!
//! Lifecycle: `start` is a no-op while running, and a stopped scheduler is
//! terminal. Restarting after `stop` requires constructing a new scheduler.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use prospector_core::SessionRefresher;
//! use prospector_infra::scheduling::{RefreshScheduler, RefreshSchedulerConfig};
//!
//! # async fn example(refresher: Arc<dyn SessionRefresher>) -> Result<(), String> {
//! let mut scheduler = RefreshScheduler::new(
//!     refresher,
//!     RefreshSchedulerConfig { interval: Duration::from_secs(120), ..Default::default() },
//! );
//!
//! scheduler.start().await.map_err(|e| e.to_string())?;
//! // ... enrichment runs ...
//! scheduler.stop().await.map_err(|e| e.to_string())?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use prospector_core::SessionRefresher;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the refresh scheduler
#[derive(Debug, Clone)]
pub struct RefreshSchedulerConfig {
    /// Time between refresh cycles
    pub interval: Duration,
    /// How long `stop` waits for the background task to finish
    pub join_timeout: Duration,
}

impl Default for RefreshSchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(120), // 2 minutes
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Interval scheduler driving a [`SessionRefresher`]
pub struct RefreshScheduler {
    refresher: Arc<dyn SessionRefresher>,
    config: RefreshSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
    stopped: bool,
}

impl RefreshScheduler {
    /// Create a new refresh scheduler
    pub fn new(refresher: Arc<dyn SessionRefresher>, config: RefreshSchedulerConfig) -> Self {
        Self {
            refresher,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
            stopped: false,
        }
    }

    /// Start the background refresh task
    ///
    /// Calling `start` on a scheduler that is already running is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Stopped`] once `stop` has been called;
    /// stopped schedulers do not restart.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.stopped {
            return Err(SchedulerError::Stopped);
        }
        if self.is_running() {
            warn!("Refresh scheduler already running");
            return Ok(());
        }

        info!(interval_secs = self.config.interval.as_secs(), "Starting refresh scheduler");

        let refresher = Arc::clone(&self.refresher);
        let interval = self.config.interval;
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::refresh_loop(refresher, interval, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        info!("Refresh scheduler started");
        Ok(())
    }

    /// Stop the scheduler gracefully
    ///
    /// Cancels the background task and awaits completion. Idempotent: a
    /// second `stop` (or a `stop` before `start`) is a no-op, but the
    /// scheduler remains terminally stopped either way.
    ///
    /// # Errors
    ///
    /// Returns an error when the background task does not finish within the
    /// configured join timeout or panicked.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        self.stopped = true;
        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            info!("Stopping refresh scheduler");
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|_| SchedulerError::Timeout { seconds: join_timeout.as_secs() })?
                .map_err(|err| SchedulerError::TaskJoinFailed(err.to_string()))?;
            info!("Refresh scheduler stopped");
        }

        Ok(())
    }

    /// Check if the scheduler is running
    ///
    /// A scheduler is considered running if it has an active task handle that
    /// hasn't finished.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Background refresh loop
    async fn refresh_loop(
        refresher: Arc<dyn SessionRefresher>,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Refresh loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    debug!("Session refresh tick");
                    // A failed cycle keeps the previous session; retry next tick
                    match refresher.refresh().await {
                        Ok(()) => info!("Session refreshed"),
                        Err(e) => error!(error = %e, "Scheduled session refresh failed"),
                    }
                }
            }
        }
    }
}

/// Ensure the background task is cancelled when the scheduler is dropped
impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if !self.cancellation_token.is_cancelled() {
            warn!("RefreshScheduler dropped while running; cancelling");
            self.cancellation_token.cancel();
        }
    }
}
