//! User intents handed to the session controller.

use exchange_rates::CurrencyCode;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::amount::Amount;

/// One user action, constructed per button press and consumed immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    /// Ask the server how many requests remain before throttling.
    ProbeAttempts,
    /// Ask for the current `from -> to` rate.
    GetRate { from: CurrencyCode, to: CurrencyCode },
    /// Ask the server to convert `amount` from one currency to another.
    Convert {
        amount: Amount,
        from: CurrencyCode,
        to: CurrencyCode,
    },
}

impl Intent {
    pub fn rate(from: CurrencyCode, to: CurrencyCode) -> Self {
        Intent::GetRate { from, to }
    }

    pub fn convert(amount: Amount, from: CurrencyCode, to: CurrencyCode) -> Self {
        Intent::Convert { amount, from, to }
    }

    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::ProbeAttempts => "probe_attempts",
            Intent::GetRate { .. } => "get_rate",
            Intent::Convert { .. } => "convert",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::ProbeAttempts => write!(f, "remaining attempts"),
            Intent::GetRate { from, to } => write!(f, "rate {from} -> {to}"),
            Intent::Convert { amount, from, to } => write!(f, "convert {amount} {from} -> {to}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_kind() {
        assert_eq!(Intent::ProbeAttempts.kind(), "probe_attempts");
        assert_eq!(
            Intent::rate(CurrencyCode::USD, CurrencyCode::EUR).kind(),
            "get_rate"
        );
    }

    #[test]
    fn test_intent_display() {
        let intent = Intent::convert(
            "12.50".parse().unwrap(),
            CurrencyCode::USD,
            CurrencyCode::UAH,
        );
        assert_eq!(intent.to_string(), "convert 12.50 USD -> UAH");
    }

    #[test]
    fn test_intent_serde_shape() {
        let intent = Intent::rate(CurrencyCode::PLN, CurrencyCode::BYN);
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["intent"], "get_rate");
        assert_eq!(json["from"], "PLN");
        assert_eq!(json["to"], "BYN");
    }
}
