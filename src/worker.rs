//! Background refresh: the initial build of an empty index and periodic refreshes.
//!
//! Failures are logged and never stop the worker; the previous index keeps serving.

use crate::error::RefreshError;
use crate::service::DocsService;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// Refreshes the index on a fixed interval until cancelled.
#[derive(Debug)]
pub struct RefreshWorker {
    service: Arc<DocsService>,
    period: Duration,
    cancel: CancellationToken,
}

impl RefreshWorker {
    pub fn new(service: Arc<DocsService>, period: Duration, cancel: CancellationToken) -> Self {
        Self {
            service,
            period,
            cancel,
        }
    }

    /// Run until the cancellation token fires.
    ///
    /// The first refresh happens one full period after start; the initial
    /// build is [`spawn_initial_build`]'s job.
    pub async fn run(&self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                _ = ticker.tick() => self.refresh_once().await,
            }
        }
        tracing::debug!("Refresh worker stopped");
    }

    async fn refresh_once(&self) {
        match self.service.refresh(&self.cancel).await {
            Ok(report) => {
                tracing::debug!(generation = report.generation, "Periodic refresh committed");
            }
            Err(RefreshError::InProgress | RefreshError::Cancelled) => {}
            Err(e) => tracing::warn!(error = %e, "Periodic refresh failed"),
        }
    }
}

/// Spawn the periodic refresh worker as a tokio task.
pub fn spawn_refresh_worker(
    service: Arc<DocsService>,
    period: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tracing::info!(period = ?period, "Starting periodic refresh worker");
    tokio::spawn(async move {
        RefreshWorker::new(service, period, cancel).run().await;
    })
}

/// Build the index in the background, so the server can answer (with empty
/// results) while the first fetch runs.
pub fn spawn_initial_build(
    service: Arc<DocsService>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("No index yet, building in the background");
        if let Err(e) = service.refresh(&cancel).await {
            tracing::error!(error = %e, "Initial index build failed; use refresh_docs to retry");
        }
    })
}
