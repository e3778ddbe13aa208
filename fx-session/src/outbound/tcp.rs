//! TCP transport for the exchange server.
//!
//! One connection per call: connect, write the whole command, one bounded
//! read, close. The stream is dropped on every exit path, which closes it.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use fx_types::{Transport, TransportError};

use crate::codec::{self, REPLY_BUFFER_SIZE};

/// Address of the reference exchange server.
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:12345";

/// Transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// `host:port` of the exchange server
    pub server_addr: String,
    /// Bound on establishing a connection
    pub connect_timeout: Duration,
    /// Bound on each write and read once connected
    pub io_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            connect_timeout: Duration::from_secs(1),
            io_timeout: Duration::from_secs(10),
        }
    }
}

/// Stateless per-call TCP client.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    config: TransportConfig,
}

impl TcpTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    async fn connect(&self) -> Result<TcpStream, TransportError> {
        let addr = &self.config.server_addr;
        match timeout(self.config.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                debug!("Connected to {}", addr);
                Ok(stream)
            }
            Ok(Err(e)) => {
                warn!("Connect to {} failed: {}", addr, e);
                Err(self.unreachable(e.to_string()))
            }
            Err(_) => {
                warn!(
                    "Connect to {} timed out after {:?}",
                    addr, self.config.connect_timeout
                );
                Err(self.unreachable(format!(
                    "connect timed out after {} ms",
                    self.config.connect_timeout.as_millis()
                )))
            }
        }
    }

    /// Runs one write or read under the I/O timeout.
    async fn bounded<T>(
        &self,
        what: &str,
        op: impl Future<Output = std::io::Result<T>>,
    ) -> Result<T, TransportError> {
        match timeout(self.config.io_timeout, op).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(self.io_failure(format!("{what} failed: {e}"))),
            Err(_) => Err(self.io_failure(format!(
                "{what} timed out after {} ms",
                self.config.io_timeout.as_millis()
            ))),
        }
    }

    fn unreachable(&self, reason: String) -> TransportError {
        TransportError::Unreachable {
            addr: self.config.server_addr.clone(),
            reason,
        }
    }

    fn io_failure(&self, reason: String) -> TransportError {
        TransportError::IoFailure {
            addr: self.config.server_addr.clone(),
            reason,
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    #[instrument(skip(self, command), fields(addr = %self.config.server_addr))]
    async fn exchange(&self, command: &str) -> Result<String, TransportError> {
        let mut stream = self.connect().await?;

        self.bounded("write", stream.write_all(command.as_bytes()))
            .await?;

        let mut buffer = [0u8; REPLY_BUFFER_SIZE];
        let read = self.bounded("read", stream.read(&mut buffer)).await?;
        debug!("Received {} bytes", read);

        Ok(codec::decode_reply(&buffer[..read]))
    }

    #[instrument(skip(self), fields(addr = %self.config.server_addr))]
    async fn probe(&self) -> Result<(), TransportError> {
        self.connect().await.map(drop)
    }

    fn endpoint(&self) -> String {
        self.config.server_addr.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_config_default() {
        let config = TransportConfig::default();
        assert_eq!(config.server_addr, "127.0.0.1:12345");
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert_eq!(config.io_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_endpoint_is_configured_address() {
        let transport = TcpTransport::new(TransportConfig {
            server_addr: "10.0.0.5:9000".into(),
            ..Default::default()
        });
        assert_eq!(transport.endpoint(), "10.0.0.5:9000");
        assert_eq!(transport.config().server_addr, "10.0.0.5:9000");
    }
}
