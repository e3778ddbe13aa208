//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The session layer depends on these traits, not concrete implementations.

mod clock;
mod feed;
mod transport;

pub use clock::{Clock, SystemClock};
pub use feed::RateFeed;
pub use transport::Transport;
