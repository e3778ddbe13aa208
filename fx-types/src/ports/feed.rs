//! Reference rate feed port.
//!
//! Implementations can be HTTP clients, fixed tables, mock providers, etc.

use exchange_rates::CurrencyCode;

use crate::domain::RateTable;
use crate::error::FetchError;

/// Port trait for the external reference rate source.
#[async_trait::async_trait]
pub trait RateFeed: Send + Sync {
    /// Fetches the latest rates for one unit of `base`.
    async fn fetch(&self, base: CurrencyCode) -> Result<RateTable, FetchError>;
}
