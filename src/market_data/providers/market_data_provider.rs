use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::market_data::market_data_errors::MarketDataError;
use crate::market_data::market_data_model::DividendEvent;

/// External market data capability.
///
/// The split between `Err` and `Ok(None)` carries meaning: `Err` is a
/// transient problem worth retrying (timeout, rate limit), while
/// `Ok(None)` is a definitive answer that the provider has no data for
/// the symbol, which no amount of retrying will change.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Most recent traded price for the symbol.
    async fn get_current_price(&self, symbol: &str)
        -> Result<Option<Decimal>, MarketDataError>;

    /// Most recent historical close, the fallback when the live price
    /// field is unavailable.
    async fn get_recent_close(&self, symbol: &str) -> Result<Option<Decimal>, MarketDataError>;

    /// All dividend events on record for the symbol, oldest first as
    /// returned by the provider. An empty list is normal for
    /// non-dividend payers.
    async fn get_dividend_history(
        &self,
        symbol: &str,
    ) -> Result<Vec<DividendEvent>, MarketDataError>;

    /// Current exchange rate: 1 `base` = X `quote`.
    async fn get_fx_quote(
        &self,
        base: &str,
        quote: &str,
    ) -> Result<Option<Decimal>, MarketDataError>;
}
