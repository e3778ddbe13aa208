//! Currency Catalog with Macro-Based Currency Generation
//!
//! The exchange server only understands a fixed set of three-letter codes.
//! Currencies are defined declaratively using a macro that generates the
//! `CurrencyCode` enum, its parsing and display, and the ordered catalog the
//! user picks from.
//!
//! # Adding a New Currency
//! Add a line to the `define_currencies!` macro invocation:
//! ```ignore
//! define_currencies! {
//!     // ... existing currencies ...
//!     GBP => ("GBP", "British Pound", "https://flagcdn.com/w40/gb.png"),
//! }
//! ```
//!
//! # Example
//! ```
//! use exchange_rates::{CurrencyCode, list_currencies};
//!
//! let first = list_currencies()[0];
//! assert_eq!(first.code, CurrencyCode::USD);
//!
//! let code: CurrencyCode = "uah".parse().unwrap();
//! assert_eq!(code.to_string(), "UAH");
//! ```

use std::fmt;

/// Error returned when a code is not part of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown currency: {0}. Supported: {supported}", supported = supported_codes())]
pub struct UnknownCurrency(pub String);

/// A catalog entry: the code sent on the wire and the icon the UI shows for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Currency {
    pub code: CurrencyCode,
    pub display_icon_ref: &'static str,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// THE MACRO: Defines CurrencyCode, its metadata and the ordered catalog
// ─────────────────────────────────────────────────────────────────────────────

/// Macro to define currencies with auto-generated code enum and catalog.
///
/// # Syntax
/// ```ignore
/// define_currencies! {
///     CurrencyName => ("CODE", "Display name", "icon url"),
/// }
/// ```
///
/// Declaration order is catalog order.
#[macro_export]
macro_rules! define_currencies {
    (
        $(
            $name:ident => ($code:literal, $display:literal, $icon:literal)
        ),* $(,)?
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "UPPERCASE")]
        pub enum CurrencyCode {
            $($name),*
        }

        impl CurrencyCode {
            pub fn code(&self) -> &'static str {
                match self {
                    $(CurrencyCode::$name => $code),*
                }
            }

            pub fn display_name(&self) -> &'static str {
                match self {
                    $(CurrencyCode::$name => $display),*
                }
            }

            pub fn icon_ref(&self) -> &'static str {
                match self {
                    $(CurrencyCode::$name => $icon),*
                }
            }

            pub fn all() -> &'static [CurrencyCode] {
                &[$(CurrencyCode::$name),*]
            }
        }

        impl std::fmt::Display for CurrencyCode {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.code())
            }
        }

        impl std::str::FromStr for CurrencyCode {
            type Err = UnknownCurrency;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_uppercase().as_str() {
                    $($code => Ok(CurrencyCode::$name),)*
                    _ => Err(UnknownCurrency(s.to_string())),
                }
            }
        }

        static CATALOG: &[Currency] = &[
            $(Currency { code: CurrencyCode::$name, display_icon_ref: $icon }),*
        ];
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// CURRENCY DEFINITIONS - Add new currencies here!
// ─────────────────────────────────────────────────────────────────────────────

define_currencies! {
    USD => ("USD", "US Dollar", "https://flagcdn.com/w40/us.png"),
    EUR => ("EUR", "Euro", "https://flagcdn.com/w40/eu.png"),
    UAH => ("UAH", "Ukrainian Hryvnia", "https://flagcdn.com/w40/ua.png"),
    RUB => ("RUB", "Russian Ruble", "https://flagcdn.com/w40/ru.png"),
    PLN => ("PLN", "Polish Zloty", "https://flagcdn.com/w40/pl.png"),
    BYN => ("BYN", "Belarusian Ruble", "https://flagcdn.com/w40/by.png"),
}

/// Returns the fixed catalog in display order.
pub fn list_currencies() -> &'static [Currency] {
    CATALOG
}

/// Looks up the catalog entry for a code.
pub fn currency(code: CurrencyCode) -> Currency {
    Currency {
        code,
        display_icon_ref: code.icon_ref(),
    }
}

fn supported_codes() -> String {
    CurrencyCode::all()
        .iter()
        .map(CurrencyCode::code)
        .collect::<Vec<_>>()
        .join(", ")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order() {
        let codes: Vec<&str> = list_currencies().iter().map(|c| c.code.code()).collect();
        assert_eq!(codes, vec!["USD", "EUR", "UAH", "RUB", "PLN", "BYN"]);
    }

    #[test]
    fn test_catalog_codes_are_unique() {
        let mut codes: Vec<CurrencyCode> = list_currencies().iter().map(|c| c.code).collect();
        codes.sort_by_key(|c| c.code());
        codes.dedup();
        assert_eq!(codes.len(), 6);
    }

    #[test]
    fn test_currency_code_parse() {
        assert_eq!("USD".parse::<CurrencyCode>().unwrap(), CurrencyCode::USD);
        assert_eq!("byn".parse::<CurrencyCode>().unwrap(), CurrencyCode::BYN);
        assert_eq!(" pln ".parse::<CurrencyCode>().unwrap(), CurrencyCode::PLN);
    }

    #[test]
    fn test_unknown_currency_rejected() {
        let err = "GBP".parse::<CurrencyCode>().unwrap_err();
        assert_eq!(err, UnknownCurrency("GBP".to_string()));
        assert_eq!(
            err.to_string(),
            "Unknown currency: GBP. Supported: USD, EUR, UAH, RUB, PLN, BYN"
        );
    }

    #[test]
    fn test_currency_code_display() {
        assert_eq!(CurrencyCode::UAH.to_string(), "UAH");
        assert_eq!(currency(CurrencyCode::EUR).to_string(), "EUR");
    }

    #[test]
    fn test_icon_refs() {
        assert_eq!(
            currency(CurrencyCode::EUR).display_icon_ref,
            "https://flagcdn.com/w40/eu.png"
        );
        for entry in list_currencies() {
            assert_eq!(entry.display_icon_ref, entry.code.icon_ref());
        }
    }

    #[test]
    fn test_serde_uses_code() {
        let json = serde_json::to_string(&CurrencyCode::RUB).unwrap();
        assert_eq!(json, "\"RUB\"");
        let back: CurrencyCode = serde_json::from_str("\"EUR\"").unwrap();
        assert_eq!(back, CurrencyCode::EUR);
    }
}
