//! Reference rates published by the refresh service.

use chrono::{DateTime, Utc};
use exchange_rates::CurrencyCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::FetchError;

/// Rates keyed by currency code, as returned by the feed.
///
/// Keys are plain strings because the feed returns many more currencies than
/// the catalog knows about.
pub type RateTable = HashMap<String, f64>;

/// The last successfully fetched rate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub base: CurrencyCode,
    pub rates: RateTable,
    pub fetched_at: DateTime<Utc>,
}

impl RateSnapshot {
    pub fn new(base: CurrencyCode, rates: RateTable, fetched_at: DateTime<Utc>) -> Self {
        Self {
            base,
            rates,
            fetched_at,
        }
    }

    /// Rate of one `base` unit in `code`.
    pub fn rate(&self, code: CurrencyCode) -> Result<f64, FetchError> {
        self.rates
            .get(code.code())
            .copied()
            .ok_or(FetchError::CurrencyNotFound(code))
    }
}

/// A refresh that failed after the current snapshot was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub message: String,
    pub at: DateTime<Utc>,
}

/// The value readers observe: the last good snapshot plus the last failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateFeedState {
    pub snapshot: Option<RateSnapshot>,
    pub last_failure: Option<FetchFailure>,
}

impl RateFeedState {
    /// Replaces the snapshot wholesale and clears any failure marker.
    pub fn record_success(&mut self, snapshot: RateSnapshot) {
        self.snapshot = Some(snapshot);
        self.last_failure = None;
    }

    /// Marks the current snapshot as stale. The snapshot itself is kept.
    pub fn record_failure(&mut self, error: &FetchError, at: DateTime<Utc>) {
        self.last_failure = Some(FetchFailure {
            message: error.to_string(),
            at,
        });
    }

    /// True when a snapshot is shown but the latest refresh failed.
    pub fn is_stale(&self) -> bool {
        self.snapshot.is_some() && self.last_failure.is_some()
    }

    /// The line shown next to the selected target currency.
    pub fn display_line(&self, selected: CurrencyCode) -> String {
        let Some(snapshot) = &self.snapshot else {
            return match &self.last_failure {
                Some(failure) => format!("Rate update failed: {}", failure.message),
                None => "Rate not loaded yet".to_string(),
            };
        };

        let line = match snapshot.rate(selected) {
            Ok(rate) => format!("Rate {selected}: {rate:.4}"),
            Err(e) => e.to_string(),
        };

        match &self.last_failure {
            Some(failure) => format!("{line} (stale: {})", failure.message),
            None => line,
        }
    }
}
