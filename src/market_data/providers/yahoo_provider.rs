use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use log::debug;
use rust_decimal::Decimal;
use yahoo_finance_api as yahoo;

use super::market_data_provider::MarketDataProvider;
use crate::market_data::market_data_errors::MarketDataError;
use crate::market_data::market_data_model::DividendEvent;

/// Window scanned for the most recent close. A week covers weekends and
/// exchange holidays.
const RECENT_CLOSE_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Market data capability backed by Yahoo Finance chart data.
pub struct YahooProvider {
    provider: yahoo::YahooConnector,
}

impl YahooProvider {
    pub fn new() -> Result<Self, MarketDataError> {
        let provider = yahoo::YahooConnector::new()?;
        Ok(Self { provider })
    }

    /// Folds "the provider has nothing for this symbol" into `Ok(None)`
    /// so only transient failures surface as `Err`.
    fn none_when_not_found<T>(
        error: yahoo::YahooError,
        empty: T,
    ) -> Result<T, MarketDataError> {
        match MarketDataError::from(error) {
            MarketDataError::NotFound(reason) => {
                debug!("No provider data: {}", reason);
                Ok(empty)
            }
            other => Err(other),
        }
    }
}

/// A quote value is only usable when it is a real, positive number.
fn positive_decimal(value: f64) -> Option<Decimal> {
    if value > 0.0 {
        Decimal::from_f64_retain(value)
    } else {
        None
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn get_current_price(
        &self,
        symbol: &str,
    ) -> Result<Option<Decimal>, MarketDataError> {
        match self.provider.get_latest_quotes(symbol, "1d").await {
            Ok(response) => match response.last_quote() {
                Ok(quote) => Ok(positive_decimal(quote.close)),
                Err(_) => Ok(None),
            },
            Err(e) => Self::none_when_not_found(e, None),
        }
    }

    async fn get_recent_close(&self, symbol: &str) -> Result<Option<Decimal>, MarketDataError> {
        let end = SystemTime::now();
        let start = end - RECENT_CLOSE_WINDOW;

        match self
            .provider
            .get_quote_history(symbol, start.into(), end.into())
            .await
        {
            Ok(response) => {
                let close = response
                    .quotes()
                    .unwrap_or_default()
                    .last()
                    .and_then(|quote| positive_decimal(quote.close));
                Ok(close)
            }
            Err(e) => Self::none_when_not_found(e, None),
        }
    }

    async fn get_dividend_history(
        &self,
        symbol: &str,
    ) -> Result<Vec<DividendEvent>, MarketDataError> {
        // The chart endpoint reports dividend events alongside quotes;
        // starting from the epoch yields the full payment record.
        let end = SystemTime::now();
        let start = SystemTime::UNIX_EPOCH;

        let response = match self
            .provider
            .get_quote_history(symbol, start.into(), end.into())
            .await
        {
            Ok(response) => response,
            Err(e) => return Self::none_when_not_found(e, Vec::new()),
        };

        let mut events: Vec<DividendEvent> = response
            .dividends()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|dividend| {
                let date = Utc
                    .timestamp_opt(dividend.date as i64, 0)
                    .single()?
                    .date_naive();
                let amount_per_share = positive_decimal(dividend.amount)?;
                Some(DividendEvent {
                    date,
                    amount_per_share,
                })
            })
            .collect();
        events.sort_by_key(|event| event.date);

        Ok(events)
    }

    async fn get_fx_quote(
        &self,
        base: &str,
        quote: &str,
    ) -> Result<Option<Decimal>, MarketDataError> {
        let symbol = format!("{}{}=X", base, quote);

        // Live rate first, then the most recent close, same as prices.
        if let Some(rate) = self.get_current_price(&symbol).await? {
            return Ok(Some(rate));
        }
        self.get_recent_close(&symbol).await
    }
}
