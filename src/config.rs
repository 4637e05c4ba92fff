use std::time::Duration;

use crate::constants::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_FX_PAIRS, DEFAULT_MAX_ATTEMPTS, DEFAULT_REQUEST_DELAY_MS,
};
use crate::errors::{ConfigError, Error, Result};

/// Everything the engine needs at startup. Built once in the binary and
/// handed to the service constructors; library code never reads the
/// environment on its own.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub market_data: MarketDataConfig,
}

/// Knobs for the market data fetch cycle.
#[derive(Debug, Clone)]
pub struct MarketDataConfig {
    /// Attempts per ticker before giving up on a price
    pub max_attempts: u32,
    /// First backoff delay; doubles on every subsequent attempt
    pub base_delay: Duration,
    /// Pause between consecutive ticker fetches (rate limit courtesy)
    pub request_delay: Duration,
    /// Currency pairs refreshed each cycle, as (base, quote)
    pub fx_pairs: Vec<(String, String)>,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            fx_pairs: DEFAULT_FX_PAIRS
                .iter()
                .map(|(base, quote)| (base.to_string(), quote.to_string()))
                .collect(),
        }
    }
}

impl AppConfig {
    /// Reads `DATABASE_URL` plus optional overrides. Call after
    /// `dotenvy::dotenv()` from the binary entry point.
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| Error::Config(ConfigError::MissingKey("DATABASE_URL".to_string())))?;

        let mut market_data = MarketDataConfig::default();
        if let Ok(value) = std::env::var("PRICE_FETCH_MAX_ATTEMPTS") {
            market_data.max_attempts = value.parse().map_err(|_| {
                Error::Config(ConfigError::InvalidValue(format!(
                    "PRICE_FETCH_MAX_ATTEMPTS: '{}'",
                    value
                )))
            })?;
        }
        if let Ok(value) = std::env::var("PRICE_FETCH_BASE_DELAY_MS") {
            let millis: u64 = value.parse().map_err(|_| {
                Error::Config(ConfigError::InvalidValue(format!(
                    "PRICE_FETCH_BASE_DELAY_MS: '{}'",
                    value
                )))
            })?;
            market_data.base_delay = Duration::from_millis(millis);
        }

        Ok(Self {
            database_url,
            market_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_data_defaults() {
        let config = MarketDataConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay, Duration::from_millis(1000));
        assert_eq!(config.fx_pairs.len(), 2);
        assert_eq!(config.fx_pairs[0], ("USD".to_string(), "CLP".to_string()));
    }
}
