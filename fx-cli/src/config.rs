//! Configuration loading from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};

use exchange_rates::CurrencyCode;
use fx_feed::DEFAULT_FEED_URL;
use fx_session::outbound::DEFAULT_SERVER_ADDR;
use fx_session::service::DEFAULT_THROTTLE_MARKER;
use fx_session::{RefreshConfig, SessionConfig, TransportConfig};
use fx_types::BLOCK_EXTENSION;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub connect_timeout: Duration,
    pub io_timeout: Duration,
    pub throttle_marker: String,
    pub feed_url: String,
    pub feed_base: CurrencyCode,
    pub feed_timeout: Duration,
    pub refresh_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults for
    /// unset keys. Set but invalid values are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let server_addr = lookup("FX_SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.into());
        if server_addr.trim().is_empty() {
            bail!("FX_SERVER_ADDR must not be empty");
        }

        let throttle_marker =
            lookup("FX_THROTTLE_MARKER").unwrap_or_else(|| DEFAULT_THROTTLE_MARKER.into());
        if throttle_marker.is_empty() {
            bail!("FX_THROTTLE_MARKER must not be empty");
        }

        Ok(Self {
            server_addr,
            connect_timeout: millis(&lookup, "FX_CONNECT_TIMEOUT_MS", 1_000)?,
            io_timeout: millis(&lookup, "FX_IO_TIMEOUT_MS", 10_000)?,
            throttle_marker,
            feed_url: lookup("FX_FEED_URL").unwrap_or_else(|| DEFAULT_FEED_URL.into()),
            feed_base: parsed(&lookup, "FX_FEED_BASE", CurrencyCode::USD)?,
            feed_timeout: millis(&lookup, "FX_FEED_TIMEOUT_MS", 10_000)?,
            refresh_interval: Duration::from_secs(positive(
                &lookup,
                "FX_REFRESH_INTERVAL_SECS",
                300,
            )?),
        })
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            server_addr: self.server_addr.clone(),
            connect_timeout: self.connect_timeout,
            io_timeout: self.io_timeout,
        }
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            throttle_marker: self.throttle_marker.clone(),
            block_extension: BLOCK_EXTENSION,
        }
    }

    pub fn refresh(&self) -> RefreshConfig {
        RefreshConfig {
            base: self.feed_base,
            interval: self.refresh_interval,
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key}: {raw:?}")),
        None => Ok(default),
    }
}

fn positive(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> anyhow::Result<u64> {
    let value: u64 = parsed(lookup, key, default)?;
    if value == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(value)
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> anyhow::Result<Duration> {
    positive(lookup, key, default).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.server_addr, "127.0.0.1:12345");
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert_eq!(config.io_timeout, Duration::from_secs(10));
        assert_eq!(config.throttle_marker, "Превышен лимит запросов");
        assert_eq!(
            config.feed_url,
            "https://api.exchangerate-api.com/v4/latest"
        );
        assert_eq!(config.feed_base, CurrencyCode::USD);
        assert_eq!(config.feed_timeout, Duration::from_secs(10));
        assert_eq!(config.refresh_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("FX_SERVER_ADDR", "10.0.0.7:4000"),
            ("FX_CONNECT_TIMEOUT_MS", "250"),
            ("FX_THROTTLE_MARKER", "RATE_LIMITED"),
            ("FX_FEED_BASE", "eur"),
            ("FX_REFRESH_INTERVAL_SECS", "60"),
        ])
        .unwrap();

        assert_eq!(config.transport().server_addr, "10.0.0.7:4000");
        assert_eq!(config.transport().connect_timeout, Duration::from_millis(250));
        assert_eq!(config.session().throttle_marker, "RATE_LIMITED");
        assert_eq!(config.session().block_extension, Duration::from_secs(60));
        assert_eq!(config.refresh().base, CurrencyCode::EUR);
        assert_eq!(config.refresh().interval, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let err = load(&[("FX_IO_TIMEOUT_MS", "ten")]).unwrap_err();
        assert!(err.to_string().contains("FX_IO_TIMEOUT_MS"));

        assert!(load(&[("FX_REFRESH_INTERVAL_SECS", "0")]).is_err());
        assert!(load(&[("FX_FEED_TIMEOUT_MS", "-5")]).is_err());
    }

    #[test]
    fn test_unknown_feed_base_rejected() {
        let err = load(&[("FX_FEED_BASE", "GBP")]).unwrap_err();
        assert!(err.to_string().contains("FX_FEED_BASE"));
    }

    #[test]
    fn test_empty_values_rejected() {
        assert!(load(&[("FX_SERVER_ADDR", " ")]).is_err());
        assert!(load(&[("FX_THROTTLE_MARKER", "")]).is_err());
    }
}
