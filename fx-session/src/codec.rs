//! Wire codec for the exchange server protocol.
//!
//! Requests are single text lines, fields separated by one space, with no
//! terminator:
//!
//! ```text
//! ATTEMPTS
//! RATE <FROM> <TO>
//! CONVERT <AMOUNT> <FROM> <TO>
//! ```
//!
//! Replies are unframed UTF-8 text. The protocol assumes a reply fits in a
//! single read of [`REPLY_BUFFER_SIZE`] bytes.

use exchange_rates::{CurrencyCode, UnknownCurrency};
use fx_types::{AmountError, Intent};

/// Size of the single read buffer used for replies.
pub const REPLY_BUFFER_SIZE: usize = 1024;

pub const ATTEMPTS: &str = "ATTEMPTS";
pub const RATE: &str = "RATE";
pub const CONVERT: &str = "CONVERT";

/// Errors parsing a request line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Empty request")]
    Empty,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("{command} expects {expected} arguments, got {got}")]
    Arity {
        command: &'static str,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    Currency(#[from] UnknownCurrency),

    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// Encodes an intent as a request line.
pub fn encode(intent: &Intent) -> String {
    match intent {
        Intent::ProbeAttempts => ATTEMPTS.to_string(),
        Intent::GetRate { from, to } => format!("{RATE} {from} {to}"),
        Intent::Convert { amount, from, to } => format!("{CONVERT} {amount} {from} {to}"),
    }
}

/// Encodes an intent as the bytes written to the socket.
pub fn encode_bytes(intent: &Intent) -> Vec<u8> {
    encode(intent).into_bytes()
}

/// Decodes the bytes of one read. Invalid sequences (such as a character cut
/// at the buffer edge) become U+FFFD instead of failing the whole reply.
pub fn decode_reply(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf).into_owned()
}

/// Parses a request line back into an intent.
pub fn parse_request(line: &str) -> Result<Intent, CodecError> {
    let mut parts = line.split_whitespace();
    let command = parts.next().ok_or(CodecError::Empty)?;
    let args: Vec<&str> = parts.collect();

    let expect = |command: &'static str, expected: usize| {
        if args.len() == expected {
            Ok(())
        } else {
            Err(CodecError::Arity {
                command,
                expected,
                got: args.len(),
            })
        }
    };

    match command {
        ATTEMPTS => {
            expect(ATTEMPTS, 0)?;
            Ok(Intent::ProbeAttempts)
        }
        RATE => {
            expect(RATE, 2)?;
            Ok(Intent::GetRate {
                from: args[0].parse::<CurrencyCode>()?,
                to: args[1].parse::<CurrencyCode>()?,
            })
        }
        CONVERT => {
            expect(CONVERT, 3)?;
            Ok(Intent::Convert {
                amount: args[0].parse()?,
                from: args[1].parse::<CurrencyCode>()?,
                to: args[2].parse::<CurrencyCode>()?,
            })
        }
        other => Err(CodecError::UnknownCommand(other.to_string())),
    }
}
