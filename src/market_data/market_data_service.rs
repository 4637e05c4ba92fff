use chrono::Utc;
use log::{error, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::market_data_errors::MarketDataError;
use super::market_data_model::{
    fx_pair, DividendEvent, DividendRecord, DividendUpdateReport, FxRate, FxUpdateReport,
    PriceObservation, PriceUpdateReport,
};
use super::market_data_traits::{MarketDataRepositoryTrait, Sleeper, TokioSleeper};
use super::providers::MarketDataProvider;
use crate::config::MarketDataConfig;
use crate::constants::DEFAULT_CURRENCY;
use crate::positions::shares_at_date;
use crate::symbols;
use crate::transactions::Transaction;

/// Bridge between the ledger and the external market data capability.
///
/// Everything here assumes the provider is unreliable: per-ticker price
/// fetches retry with exponential backoff, and every batch operation
/// reports failures instead of raising them, so one dead symbol never
/// blocks the rest of the refresh cycle.
pub struct MarketDataService {
    provider: Arc<dyn MarketDataProvider>,
    repository: Arc<dyn MarketDataRepositoryTrait>,
    config: MarketDataConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl MarketDataService {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        repository: Arc<dyn MarketDataRepositoryTrait>,
        config: MarketDataConfig,
    ) -> Self {
        Self::with_sleeper(provider, repository, config, Arc::new(TokioSleeper))
    }

    /// Constructor with an injected delay, so tests can observe backoff
    /// without waiting out real clock time.
    pub fn with_sleeper(
        provider: Arc<dyn MarketDataProvider>,
        repository: Arc<dyn MarketDataRepositoryTrait>,
        config: MarketDataConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            provider,
            repository,
            config,
            sleeper,
        }
    }

    /// Current price for an internal ticker, or None when the provider
    /// has no data or keeps failing. Never an error: the caller treats
    /// None as "skip this ticker this cycle".
    pub async fn fetch_price(&self, ticker: &str) -> Option<Decimal> {
        let symbol = symbols::resolve(ticker);

        for attempt in 0..self.config.max_attempts {
            match self.try_fetch_price(&symbol).await {
                Ok(Some(price)) => {
                    info!("Fetched price for {}: {}", ticker, price);
                    return Some(price);
                }
                Ok(None) => {
                    // Definitive answer: no amount of retrying will make
                    // a delisted or unknown symbol produce a price.
                    warn!("No price data found for {}", ticker);
                    return None;
                }
                Err(e) => {
                    if attempt + 1 < self.config.max_attempts {
                        let delay = self.config.base_delay * 2u32.pow(attempt);
                        warn!(
                            "Attempt {} failed for {}: {}. Retrying in {:?}...",
                            attempt + 1,
                            ticker,
                            e,
                            delay
                        );
                        self.sleeper.sleep(delay).await;
                    } else {
                        warn!("Attempt {} failed for {}: {}", attempt + 1, ticker, e);
                    }
                }
            }
        }

        error!(
            "Failed to fetch price for {} after {} attempts",
            ticker, self.config.max_attempts
        );
        None
    }

    /// Live price, falling back to the most recent historical close.
    async fn try_fetch_price(&self, symbol: &str) -> Result<Option<Decimal>, MarketDataError> {
        if let Some(price) = self.provider.get_current_price(symbol).await? {
            return Ok(Some(price));
        }
        self.provider.get_recent_close(symbol).await
    }

    /// Dividend history for an internal ticker. Best-effort, single call:
    /// absence is normal for non-dividend payers, so any failure just
    /// yields an empty list.
    pub async fn fetch_dividend_history(&self, ticker: &str) -> Vec<DividendEvent> {
        let symbol = symbols::resolve(ticker);

        match self.provider.get_dividend_history(&symbol).await {
            Ok(events) => {
                if !events.is_empty() {
                    info!("Found {} dividend payments for {}", events.len(), ticker);
                }
                events
            }
            Err(e) => {
                error!("Error fetching dividends for {}: {}", ticker, e);
                Vec::new()
            }
        }
    }

    /// Current exchange rate for a pair, or None on failure. The
    /// provider falls back from the live rate to the last close on its
    /// own.
    pub async fn fetch_fx_rate(&self, base: &str, quote: &str) -> Option<Decimal> {
        match self.provider.get_fx_quote(base, quote).await {
            Ok(Some(rate)) => {
                info!("Fetched FX rate {}/{}: {}", base, quote, rate);
                Some(rate)
            }
            Ok(None) => {
                warn!("No FX rate found for {}/{}", base, quote);
                None
            }
            Err(e) => {
                error!("Error fetching FX rate {}/{}: {}", base, quote, e);
                None
            }
        }
    }

    /// Refreshes prices for every given ticker, sequentially, with a
    /// throttle between requests. Each success writes the current-price
    /// cache and appends to the price time series.
    pub async fn update_prices(&self, tickers: &[String]) -> PriceUpdateReport {
        info!("Starting price update for {} tickers", tickers.len());
        let mut report = PriceUpdateReport::default();

        for (index, ticker) in tickers.iter().enumerate() {
            if index > 0 {
                self.sleeper.sleep(self.config.request_delay).await;
            }

            let Some(price) = self.fetch_price(ticker).await else {
                report.failed_tickers.push(ticker.clone());
                continue;
            };

            let observation = PriceObservation {
                ticker: ticker.clone(),
                price,
                currency: DEFAULT_CURRENCY.to_string(),
                observed_at: Utc::now().naive_utc(),
            };

            let stored = self
                .repository
                .upsert_current_price(&observation)
                .and_then(|_| self.repository.insert_price_history(&observation));
            match stored {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    error!("Failed to store price for {}: {}", ticker, e);
                    report.failed_tickers.push(ticker.clone());
                }
            }
        }

        info!(
            "Price update complete: {} updated, {} failed",
            report.updated,
            report.failed_tickers.len()
        );
        if !report.failed_tickers.is_empty() {
            warn!("Failed tickers: {:?}", report.failed_tickers);
        }
        report
    }

    /// Refreshes every configured currency pair.
    pub async fn update_fx_rates(&self) -> FxUpdateReport {
        info!("Starting FX rate update...");
        let mut report = FxUpdateReport::default();

        for (base, quote) in &self.config.fx_pairs {
            let Some(rate) = self.fetch_fx_rate(base, quote).await else {
                report.failed_pairs.push(fx_pair(base, quote));
                continue;
            };

            let fx_rate = FxRate {
                base: base.clone(),
                quote: quote.clone(),
                rate,
                observed_at: Utc::now().naive_utc(),
            };

            let stored = self
                .repository
                .upsert_current_fx_rate(&fx_rate)
                .and_then(|_| self.repository.insert_fx_rate_history(&fx_rate));
            match stored {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    error!("Failed to store FX rate {}: {}", fx_rate.pair(), e);
                    report.failed_pairs.push(fx_rate.pair());
                }
            }
        }

        report
    }

    /// Reconciles dividend income for every ticker on the ledger.
    ///
    /// Each provider event is weighted by the shares held on its date;
    /// events with no eligible shares are skipped. Records are keyed by
    /// (ticker, payment date), so re-running over the same history
    /// replaces rows instead of accumulating duplicates.
    pub async fn update_dividends(&self, transactions: &[Transaction]) -> DividendUpdateReport {
        info!("Starting dividend calculation...");
        let mut report = DividendUpdateReport::default();

        let mut tickers: Vec<&str> = transactions.iter().map(|tx| tx.ticker.as_str()).collect();
        tickers.sort_unstable();
        tickers.dedup();

        for ticker in tickers {
            let events = self.fetch_dividend_history(ticker).await;
            if events.is_empty() {
                continue;
            }
            report.tickers_with_dividends += 1;

            for event in events {
                let shares = shares_at_date(transactions, ticker, event.date);
                if shares <= Decimal::ZERO {
                    continue;
                }

                let record = DividendRecord {
                    ticker: ticker.to_string(),
                    payment_date: event.date,
                    amount_per_share: event.amount_per_share,
                    shares_held: shares,
                    total_received: shares * event.amount_per_share,
                    currency: DEFAULT_CURRENCY.to_string(),
                    recorded_at: Utc::now().naive_utc(),
                };

                match self.repository.upsert_dividend(&record) {
                    Ok(()) => report.records_written += 1,
                    Err(e) => error!(
                        "Failed to store dividend {} on {}: {}",
                        ticker, event.date, e
                    ),
                }
            }
        }

        info!(
            "Dividend update complete: {} records from {} tickers",
            report.records_written, report.tickers_with_dividends
        );
        report
    }
}
