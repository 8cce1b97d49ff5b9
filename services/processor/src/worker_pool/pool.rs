//! Worker pool management
//!
//! Runs the workers as tasks and stops them through one cancellation token.

use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::worker::Worker;

/// Pool of workers for processing bets
pub struct WorkerPool {
    workers: Vec<Arc<Worker>>,
    shutdown: CancellationToken,
}

impl WorkerPool {
    pub fn new(workers: Vec<Worker>) -> Self {
        Self {
            workers: workers.into_iter().map(Arc::new).collect(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Start all workers and wait for them to finish
    pub async fn start(&self) -> Result<()> {
        tracing::info!("Starting {} workers", self.workers.len());

        let handles = self.workers.iter().map(|worker| {
            let worker = worker.clone();
            let shutdown = self.shutdown.child_token();
            tokio::spawn(async move { worker.run(shutdown).await })
        });

        for joined in futures::future::join_all(handles).await {
            joined??;
        }

        Ok(())
    }

    /// Signal every worker to stop after its current entry
    pub fn stop(&self) {
        tracing::info!("Stopping worker pool");
        self.shutdown.cancel();
    }
}
