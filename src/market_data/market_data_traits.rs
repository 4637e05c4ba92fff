use async_trait::async_trait;
use std::time::Duration;

use super::market_data_model::{DividendRecord, FxRate, PriceObservation};
use crate::errors::Result;

/// Datastore operations backing the market data caches.
pub trait MarketDataRepositoryTrait: Send + Sync {
    /// Overwrites the single current-price row for the ticker.
    fn upsert_current_price(&self, observation: &PriceObservation) -> Result<()>;

    /// Appends one sample to the price time series.
    fn insert_price_history(&self, observation: &PriceObservation) -> Result<()>;

    fn get_current_price(&self, ticker: &str) -> Result<Option<PriceObservation>>;

    fn get_current_prices(&self) -> Result<Vec<PriceObservation>>;

    fn get_price_history(&self, ticker: &str) -> Result<Vec<PriceObservation>>;

    /// Overwrites the single row for the currency pair.
    fn upsert_current_fx_rate(&self, rate: &FxRate) -> Result<()>;

    fn insert_fx_rate_history(&self, rate: &FxRate) -> Result<()>;

    fn get_current_fx_rates(&self) -> Result<Vec<FxRate>>;

    /// Insert-or-replace keyed by (ticker, payment date).
    fn upsert_dividend(&self, record: &DividendRecord) -> Result<()>;

    fn get_dividends_for(&self, ticker: &str) -> Result<Vec<DividendRecord>>;

    fn get_all_dividends(&self) -> Result<Vec<DividendRecord>>;
}

/// Injectable delay, so backoff behavior is testable without waiting out
/// real clock time.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the Tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
