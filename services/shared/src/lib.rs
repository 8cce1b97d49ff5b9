pub mod bet;
pub mod constants;
pub mod contribution;
pub mod errors;
pub mod jackpot;
pub mod keys;
pub mod message;
pub mod money;
pub mod percentage;
pub mod reward;
pub mod store;
pub mod strategy_config;
pub mod types;

pub use bet::*;
pub use constants::*;
pub use contribution::*;
pub use errors::DomainError;
pub use jackpot::Jackpot;
pub use money::*;
pub use percentage::*;
pub use reward::*;
pub use types::*;
