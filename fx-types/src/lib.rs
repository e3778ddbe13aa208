//! # FX Types
//!
//! Domain types and port traits for the exchange session client.
//! This crate has ZERO external IO dependencies - only data structures,
//! the throttle state machine, and trait definitions.
//!
//! ## Architecture
//!
//! - `domain/` - Pure domain types (Amount, Intent, BlockState, RateSnapshot)
//! - `ports/` - Trait definitions that adapters must implement
//! - `error/` - Transport, session and feed error types

pub mod domain;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    Amount, BLOCK_EXTENSION, BlockState, BlockStatus, FetchFailure, Intent, RateFeedState,
    RateSnapshot, RateTable,
};
pub use error::{AmountError, FetchError, SessionError, TransportError};
pub use exchange_rates::{Currency, CurrencyCode, UnknownCurrency, list_currencies};
pub use ports::{Clock, RateFeed, SystemClock, Transport};
