pub mod place_bet;

pub use place_bet::{PlaceBetService, PlacementOutcome};
