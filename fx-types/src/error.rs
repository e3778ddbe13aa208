//! Error types for the exchange session client.
//!
//! Every `Display` message here is meant to be shown to the user as is.

use chrono::{DateTime, Utc};
use exchange_rates::CurrencyCode;
use std::time::Duration;

/// Amount parsing errors (input validation).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,

    #[error("Amount cannot be negative: {0}")]
    Negative(String),

    #[error("Invalid amount: {0}")]
    Invalid(String),

    #[error("Amount has more than {max} decimal places")]
    TooPrecise { max: u8 },

    #[error("Amount is too large: {0}")]
    TooLarge(String),
}

/// Socket-level failures of a single exchange with the server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connect failed or did not finish within the connect timeout.
    #[error("Server {addr} is unreachable: {reason}")]
    Unreachable { addr: String, reason: String },

    /// Write or read failed (or timed out) after the connection was open.
    #[error("I/O failure talking to {addr}: {reason}")]
    IoFailure { addr: String, reason: String },
}

/// Outcomes of a session request that did not produce a reply to display.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The client is inside the server's punitive window.
    ///
    /// `just_triggered` is true when this request's reply started the window;
    /// `reply` then carries the server text.
    #[error("{}", throttle_message(.until, .remaining, .just_triggered, .reply))]
    Throttled {
        until: DateTime<Utc>,
        remaining: Duration,
        just_triggered: bool,
        reply: Option<String>,
    },

    #[error("Connection failed: {0}")]
    ConnectionFailed(#[from] TransportError),

    #[error("Server returned an empty reply")]
    EmptyReply,
}

impl SessionError {
    pub fn is_throttled(&self) -> bool {
        matches!(self, SessionError::Throttled { .. })
    }

    /// How long the caller should wait before asking again.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            SessionError::Throttled { remaining, .. } => Some(*remaining),
            _ => None,
        }
    }
}

fn throttle_message(
    until: &DateTime<Utc>,
    remaining: &Duration,
    just_triggered: &bool,
    reply: &Option<String>,
) -> String {
    let until = until.format("%H:%M:%S");
    let secs = remaining.as_secs_f64().ceil() as u64;
    match (just_triggered, reply.as_deref().map(str::trim)) {
        (true, Some(reply)) if !reply.is_empty() => {
            format!("{reply} (blocked for {secs}s until {until})")
        }
        (true, _) => format!("Request limit exceeded, blocked for {secs}s until {until}"),
        (false, _) => format!("You are blocked until {until} ({secs}s remaining), try again later"),
    }
}

/// Rate feed failures. Never affect the throttle state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Rate feed request failed: {0}")]
    NetworkFailure(String),

    #[error("Malformed rate feed response: {0}")]
    MalformedResponse(String),

    #[error("Rate not found for {0}")]
    CurrencyNotFound(CurrencyCode),
}
