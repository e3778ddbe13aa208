//! Non-negative decimal amount that keeps the scale it was written with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AmountError;

/// Maximum number of fractional digits accepted.
pub const MAX_SCALE: u8 = 12;

/// A decimal amount stored as an integer mantissa and a decimal scale.
///
/// `12.50` is kept as mantissa `1250`, scale `2`, so it is written back to the
/// server exactly as the user typed it instead of going through a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount {
    mantissa: u64,
    scale: u8,
}

impl Amount {
    /// Creates an amount from its mantissa and scale (`1250, 2` is `12.50`).
    pub fn new(mantissa: u64, scale: u8) -> Result<Self, AmountError> {
        if scale > MAX_SCALE {
            return Err(AmountError::TooPrecise { max: MAX_SCALE });
        }
        Ok(Self { mantissa, scale })
    }

    /// Creates a whole amount.
    pub fn whole(units: u64) -> Self {
        Self {
            mantissa: units,
            scale: 0,
        }
    }

    pub fn mantissa(&self) -> u64 {
        self.mantissa
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    /// Lossy conversion for display arithmetic.
    pub fn to_f64(&self) -> f64 {
        self.mantissa as f64 / 10f64.powi(self.scale as i32)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }
        if s.starts_with('-') {
            return Err(AmountError::Negative(s.to_string()));
        }
        let unsigned = s.strip_prefix('+').unwrap_or(s);
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !all_digits(int_part)
            || !all_digits(frac_part)
        {
            return Err(AmountError::Invalid(s.to_string()));
        }
        if frac_part.len() > MAX_SCALE as usize {
            return Err(AmountError::TooPrecise { max: MAX_SCALE });
        }

        let digits = format!("{int_part}{frac_part}");
        let mantissa = digits
            .parse::<u64>()
            .map_err(|_| AmountError::TooLarge(s.to_string()))?;

        Ok(Self {
            mantissa,
            scale: frac_part.len() as u8,
        })
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let divisor = 10u64.pow(self.scale as u32);
        let whole = self.mantissa / divisor;
        let frac = self.mantissa % divisor;
        write!(f, "{}.{:0width$}", whole, frac, width = self.scale as usize)
    }
}
