//! Session Controller
//!
//! Mediates every rate and conversion request and owns the client-side
//! throttle state. Contains NO socket logic - the transport is injected.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use fx_types::{
    BLOCK_EXTENSION, BlockState, BlockStatus, Clock, Intent, SessionError, SystemClock, Transport,
    TransportError,
};

use crate::codec;

/// Phrase the reference server puts in a reply once the client is throttled.
pub const DEFAULT_THROTTLE_MARKER: &str = "Превышен лимит запросов";

/// Session behavior settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Substring that marks a reply as a rate-limit signal
    pub throttle_marker: String,
    /// Length of the block started by a rate-limit signal
    pub block_extension: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            throttle_marker: DEFAULT_THROTTLE_MARKER.to_string(),
            block_extension: BLOCK_EXTENSION,
        }
    }
}

/// Result of a connectivity probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Unreachable(TransportError),
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Unreachable(_) => write!(f, "Server unavailable"),
        }
    }
}

/// Session controller for exchange server requests.
///
/// Generic over `T: Transport` - the adapter is injected at compile time, and
/// over `C: Clock` so throttle expiry can be driven by tests.
///
/// The block state sits behind a mutex that is never held across an await,
/// so one controller can be shared between tasks.
pub struct SessionController<T: Transport, C: Clock = SystemClock> {
    transport: T,
    clock: C,
    config: SessionConfig,
    block: Mutex<BlockState>,
}

impl<T: Transport> SessionController<T> {
    /// Creates a controller using the system clock.
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self::with_clock(transport, SystemClock, config)
    }
}

impl<T: Transport, C: Clock> SessionController<T, C> {
    /// Creates a controller with an explicit clock.
    pub fn with_clock(transport: T, clock: C, config: SessionConfig) -> Self {
        Self {
            transport,
            clock,
            config,
            block: Mutex::new(BlockState::new()),
        }
    }

    /// Returns a reference to the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current throttle status for display.
    pub fn block_status(&self) -> BlockStatus {
        let now = self.clock.now();
        self.block_state().status(now)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────────────

    /// Sends one intent to the server.
    ///
    /// While blocked, fails with `Throttled` without contacting the server and
    /// without moving the deadline. Otherwise makes exactly one transport call.
    #[instrument(skip(self, intent), fields(intent = intent.kind()))]
    pub async fn execute(&self, intent: Intent) -> Result<String, SessionError> {
        let now = self.clock.now();
        if let Some(err) = self.check_blocked(now) {
            warn!("Request refused locally: {}", err);
            return Err(err);
        }

        let command = codec::encode(&intent);
        debug!("Sending {:?} to {}", command, self.transport.endpoint());

        let reply = self.transport.exchange(&command).await.map_err(|e| {
            warn!("Exchange failed: {}", e);
            SessionError::from(e)
        })?;

        if reply.is_empty() {
            warn!("Server closed the connection without a reply");
            return Err(SessionError::EmptyReply);
        }

        if reply.contains(&self.config.throttle_marker) {
            let replied_at = self.clock.now();
            let mut block = self.block_state();
            block.trigger(replied_at, self.config.block_extension);
            let until = block.until().unwrap_or(replied_at);
            warn!("Server signalled rate limit, blocked until {}", until);
            return Err(SessionError::Throttled {
                until,
                remaining: block.remaining(replied_at),
                just_triggered: true,
                reply: Some(reply),
            });
        }

        info!("Request completed");
        Ok(reply)
    }

    /// Checks whether the server accepts connections. Never touches the
    /// throttle state.
    #[instrument(skip(self))]
    pub async fn check_connection(&self) -> ConnectionStatus {
        match self.transport.probe().await {
            Ok(()) => {
                info!("Server {} is reachable", self.transport.endpoint());
                ConnectionStatus::Connected
            }
            Err(e) => {
                warn!("Probe failed: {}", e);
                ConnectionStatus::Unreachable(e)
            }
        }
    }

    /// Probes the server, then asks for the remaining request count.
    pub async fn connect(&self) -> Result<String, SessionError> {
        if let ConnectionStatus::Unreachable(e) = self.check_connection().await {
            return Err(e.into());
        }
        self.execute(Intent::ProbeAttempts).await
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Throttle state
    // ─────────────────────────────────────────────────────────────────────────────

    fn check_blocked(&self, now: chrono::DateTime<chrono::Utc>) -> Option<SessionError> {
        let mut block = self.block_state();
        if !block.is_blocked(now) {
            return None;
        }
        Some(SessionError::Throttled {
            until: block.until().unwrap_or(now),
            remaining: block.remaining(now),
            just_triggered: false,
            reply: None,
        })
    }

    fn block_state(&self) -> MutexGuard<'_, BlockState> {
        self.block.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
