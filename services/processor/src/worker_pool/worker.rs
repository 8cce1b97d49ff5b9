//! Individual worker implementation
//!
//! A worker cycles through three reads: claim entries other consumers left
//! idle, drain its own unacknowledged entries, then block on new ones. Each
//! read that comes back empty moves it to the next; a blocking read that
//! times out starts the cycle again. Whenever it leaves an entry pending after
//! a transient failure it pauses and restarts the cycle, which is how that
//! entry gets redelivered.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use shared::errors::ServiceError;
use shared::store::StoreError;
use shared::BetId;

use crate::circuit_breaker::CircuitBreaker;
use crate::consumer::{BetSource, Delivery};
use crate::errors::ProcessingError;
use crate::processing::BetProcessingService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Done with this entry: processed, duplicate, or impossible to process
    Acknowledged,
    /// Transient failure; the entry will be delivered again
    LeftPending,
}

/// Which read the worker issues next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Claim,
    Drain,
    Listen,
}

pub struct Worker {
    pub id: usize,
    source: Arc<dyn BetSource>,
    service: Arc<BetProcessingService>,
    circuit_breaker: CircuitBreaker,
    pause: Duration,
}

impl Worker {
    pub fn new(
        id: usize,
        source: Arc<dyn BetSource>,
        service: Arc<BetProcessingService>,
        circuit_breaker: CircuitBreaker,
        pause: Duration,
    ) -> Self {
        Self {
            id,
            source,
            service,
            circuit_breaker,
            pause,
        }
    }

    /// Run the worker's main processing loop until `shutdown` fires
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        tracing::info!(worker_id = self.id, "Worker started");

        let mut phase = Phase::Claim;

        while !shutdown.is_cancelled() {
            if !self.circuit_breaker.allow_request().await {
                tracing::warn!(worker_id = self.id, "Circuit breaker is open, pausing");
                self.sleep(&shutdown).await;
                continue;
            }

            let read = match phase {
                Phase::Claim => self.source.claim_stale().await,
                Phase::Drain => self.source.read_pending().await,
                Phase::Listen => tokio::select! {
                    _ = shutdown.cancelled() => break,
                    read = self.source.read_new() => read,
                },
            };

            let deliveries = match read {
                Ok(deliveries) => deliveries,
                Err(e) => {
                    tracing::error!(worker_id = self.id, error = %e, "Failed to read bet stream");
                    metrics::counter!("worker_errors_total").increment(1);
                    self.circuit_breaker.record_failure().await;
                    self.sleep(&shutdown).await;
                    continue;
                }
            };

            if deliveries.is_empty() {
                phase = match phase {
                    Phase::Claim => Phase::Drain,
                    Phase::Drain => {
                        tracing::debug!(worker_id = self.id, "Pending entries drained");
                        Phase::Listen
                    }
                    Phase::Listen => Phase::Claim,
                };
                continue;
            }

            let mut left_pending = false;
            for delivery in deliveries {
                if self.handle(delivery).await == DeliveryOutcome::LeftPending {
                    left_pending = true;
                }
            }

            if left_pending {
                phase = Phase::Claim;
                self.sleep(&shutdown).await;
            }
        }

        tracing::info!(worker_id = self.id, "Worker stopped");
        Ok(())
    }

    /// Process one entry and decide whether to acknowledge it
    pub async fn handle(&self, delivery: Delivery) -> DeliveryOutcome {
        let Delivery { entry_id, message } = delivery;

        let bet = match message.and_then(|message| message.to_bet()) {
            Ok(bet) => bet,
            Err(e) => {
                let error = ProcessingError::MalformedMessage {
                    entry_id: entry_id.clone(),
                    reason: e.to_string(),
                };
                return self.reject(&entry_id, None, error).await;
            }
        };

        match self.service.process(&bet).await {
            Ok(_) => {
                self.circuit_breaker.record_success().await;
                self.ack(&entry_id).await
            }
            Err(e) if e.is_retryable() => {
                if matches!(e, ProcessingError::Store(StoreError::Unavailable(_))) {
                    self.circuit_breaker.record_failure().await;
                }
                tracing::warn!(
                    worker_id = self.id,
                    entry_id = %entry_id,
                    bet_id = %bet.bet_id(),
                    error = %e,
                    "Transient failure, leaving entry for redelivery"
                );
                metrics::counter!("bet_processing_failures_total").increment(1);
                DeliveryOutcome::LeftPending
            }
            Err(e) => self.reject(&entry_id, Some(bet.bet_id()), e).await,
        }
    }

    /// Acknowledge an entry that can never be processed
    async fn reject(
        &self,
        entry_id: &str,
        bet_id: Option<BetId>,
        error: ProcessingError,
    ) -> DeliveryOutcome {
        let report = ServiceError::from(error);
        tracing::error!(
            worker_id = self.id,
            entry_id,
            bet_id = bet_id.map(|id| id.to_string()),
            error_code = %report.code,
            category = ?report.category,
            error = %report,
            "Bet cannot be processed, dropping"
        );
        metrics::counter!("bet_processing_failures_total").increment(1);
        self.ack(entry_id).await
    }

    async fn ack(&self, entry_id: &str) -> DeliveryOutcome {
        match self.source.ack(entry_id).await {
            Ok(()) => DeliveryOutcome::Acknowledged,
            Err(e) => {
                tracing::warn!(worker_id = self.id, entry_id, error = %e, "Failed to acknowledge entry");
                DeliveryOutcome::LeftPending
            }
        }
    }

    async fn sleep(&self, shutdown: &CancellationToken) {
        tokio::select! {
            _ = shutdown.cancelled() => {}
            _ = tokio::time::sleep(self.pause) => {}
        }
    }
}
