use std::sync::Arc;

use shared::store::RewardLookup;

use crate::config::Config;
use crate::services::PlaceBetService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub place_bets: Arc<PlaceBetService>,
    pub rewards: Arc<dyn RewardLookup>,
}

impl AppState {
    pub fn new(config: Config, place_bets: PlaceBetService, rewards: Arc<dyn RewardLookup>) -> Self {
        Self {
            config: Arc::new(config),
            place_bets: Arc::new(place_bets),
            rewards,
        }
    }
}
