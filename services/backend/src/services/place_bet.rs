//! Bet placement
//!
//! A placed bet is recorded once and published once. A resubmitted placement
//! (same bet id) is accepted again but leaves both the record and the stream
//! untouched, so retrying clients never cause a second downstream event.

use std::sync::Arc;

use shared::store::{BetStore, EventSink, StoreResult};
use shared::Bet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementOutcome {
    Placed,
    Duplicate,
}

pub struct PlaceBetService {
    bets: Arc<dyn BetStore>,
    events: Arc<dyn EventSink>,
}

impl PlaceBetService {
    pub fn new(bets: Arc<dyn BetStore>, events: Arc<dyn EventSink>) -> Self {
        Self { bets, events }
    }

    pub async fn place(&self, bet: &Bet) -> StoreResult<PlacementOutcome> {
        if self.bets.exists_by_id(bet.bet_id()).await? {
            return Ok(self.duplicate(bet));
        }

        // The existence check is only a fast path; the insert itself decides.
        if !self.bets.save(bet).await? {
            return Ok(self.duplicate(bet));
        }

        tracing::info!(
            bet_id = %bet.bet_id(),
            user_id = %bet.user_id(),
            jackpot_id = %bet.jackpot_id(),
            amount = %bet.bet_amount(),
            "Bet placed"
        );
        metrics::counter!("bets_placed_total").increment(1);

        if let Err(e) = self.events.publish(bet).await {
            tracing::error!(bet_id = %bet.bet_id(), error = %e, "Failed to publish placed bet");
            metrics::counter!("bet_publish_failures_total").increment(1);
        }

        Ok(PlacementOutcome::Placed)
    }

    fn duplicate(&self, bet: &Bet) -> PlacementOutcome {
        tracing::warn!(bet_id = %bet.bet_id(), "Bet already placed, not publishing again");
        metrics::counter!("bets_duplicate_total").increment(1);
        PlacementOutcome::Duplicate
    }
}
