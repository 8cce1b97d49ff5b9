//! Worker pool for bet processing
//!
//! Each worker owns a consumer name in the group and processes its entries
//! sequentially; parallelism comes from running several workers.

mod pool;
mod worker;

pub use pool::WorkerPool;
pub use worker::{DeliveryOutcome, Worker};
