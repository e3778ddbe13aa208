//! Domain models for the exchange session client.

pub mod amount;
pub mod block;
pub mod intent;
pub mod snapshot;

pub use amount::Amount;
pub use block::{BLOCK_EXTENSION, BlockState, BlockStatus};
pub use intent::Intent;
pub use snapshot::{FetchFailure, RateFeedState, RateSnapshot, RateTable};
