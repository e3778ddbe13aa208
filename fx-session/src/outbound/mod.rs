//! Outbound adapters.

mod tcp;

pub use tcp::{DEFAULT_SERVER_ADDR, TcpTransport, TransportConfig};
