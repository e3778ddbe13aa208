//! # FX Session
//!
//! Session layer and outbound adapters for the exchange client.
//!
//! ## Architecture
//!
//! - `codec` - Request line encoding and reply decoding (no state)
//! - `outbound/` - TCP transport adapter for the exchange server
//! - `service` - Session controller (throttle state + request orchestration)
//! - `refresh` - Periodic reference rate refresh, published over a watch channel
//!
//! The controller is generic over `T: Transport` and the refresh service over
//! `F: RateFeed`, so tests inject in-memory implementations.

pub mod codec;
pub mod outbound;
pub mod refresh;
pub mod service;


pub use codec::CodecError;
pub use outbound::{TcpTransport, TransportConfig};
pub use refresh::{RateRefreshService, RefreshConfig, RefreshHandle};
pub use service::{ConnectionStatus, SessionConfig, SessionController};
