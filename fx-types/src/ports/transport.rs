//! Exchange server transport port.
//!
//! Implementations open a connection per call; there is no session kept
//! between calls, and no call is ever retried internally.

use crate::error::TransportError;

/// Port trait for the raw request/response channel to the exchange server.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Sends one encoded command and returns the decoded reply text.
    async fn exchange(&self, command: &str) -> Result<String, TransportError>;

    /// Checks that the server accepts connections, within the connect timeout.
    async fn probe(&self) -> Result<(), TransportError>;

    /// Address used in log lines and messages.
    fn endpoint(&self) -> String;
}
