//! Interactive shell commands.

use anyhow::{Context, bail};

use exchange_rates::CurrencyCode;
use fx_session::{ConnectionStatus, codec};
use fx_types::{Intent, SessionError, TransportError};

pub const HELP: &str = "\
Commands:
  connect                      check the server and show remaining attempts
  attempts                     show remaining attempts
  rate <FROM> <TO>             ask the server for a rate
  convert <AMOUNT> <FROM> <TO> convert an amount on the server
  status                       show the throttle status
  feed                         show the reference rate for the selected currency
  select <CODE>                change the selected currency
  currencies                   list supported currencies
  help                         show this help
  quit                         leave the shell";

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Connect,
    Send(Intent),
    Status,
    Feed,
    Select(CurrencyCode),
    Currencies,
    Help,
    Quit,
}

/// Parses a shell line. Blank lines yield `None`.
///
/// Server requests reuse the wire grammar, so `rate usd eur` is accepted the
/// same way the server would accept `RATE USD EUR`.
pub fn parse(line: &str) -> anyhow::Result<Option<ShellCommand>> {
    let line = line.trim();
    let Some(word) = line.split_whitespace().next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = line.split_whitespace().skip(1).collect();

    let command = match word.to_lowercase().as_str() {
        "connect" => ShellCommand::Connect,
        "status" => ShellCommand::Status,
        "feed" => ShellCommand::Feed,
        "currencies" => ShellCommand::Currencies,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        "select" => match rest.as_slice() {
            [code] => ShellCommand::Select(code.parse()?),
            _ => bail!("usage: select <CODE>"),
        },
        "attempts" | "rate" | "convert" => {
            let request = format!("{} {}", word.to_uppercase(), rest.join(" "));
            let intent = codec::parse_request(&request)
                .with_context(|| format!("Invalid command: {line}"))?;
            ShellCommand::Send(intent)
        }
        _ => bail!("Unknown command: {word}. Type 'help' for a list."),
    };
    Ok(Some(command))
}

/// Status line for the outcome of `SessionController::connect`.
///
/// Only a failed connect counts as unreachable. A refused or failed
/// `ATTEMPTS` exchange still means the server answered the probe.
pub fn connect_status(result: &Result<String, SessionError>) -> ConnectionStatus {
    match result {
        Err(SessionError::ConnectionFailed(e @ TransportError::Unreachable { .. })) => {
            ConnectionStatus::Unreachable(e.clone())
        }
        _ => ConnectionStatus::Connected,
    }
}
