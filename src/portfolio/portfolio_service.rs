use chrono::Utc;
use log::{info, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use super::portfolio_model::{Holding, PortfolioSnapshot, PortfolioSummary};
use super::portfolio_traits::SnapshotRepositoryTrait;
use crate::constants::DECIMAL_PRECISION;
use crate::errors::Result;
use crate::market_data::{DividendRecord, MarketDataRepositoryTrait};
use crate::positions::{shares_at_date, weighted_average_cost};
use crate::transactions::TransactionRepositoryTrait;

/// Turns the ledger plus the latest fetched prices into holding-level
/// and portfolio-level numbers, and writes the daily snapshot.
pub struct PortfolioService {
    transactions: Arc<dyn TransactionRepositoryTrait>,
    market_data: Arc<dyn MarketDataRepositoryTrait>,
    snapshots: Arc<dyn SnapshotRepositoryTrait>,
}

impl PortfolioService {
    pub fn new(
        transactions: Arc<dyn TransactionRepositoryTrait>,
        market_data: Arc<dyn MarketDataRepositoryTrait>,
        snapshots: Arc<dyn SnapshotRepositoryTrait>,
    ) -> Self {
        Self {
            transactions,
            market_data,
            snapshots,
        }
    }

    /// Current holdings with valuation, one entry per ticker with a
    /// positive position. A ticker without a cached price still shows
    /// up, valued at zero.
    pub fn holdings(&self) -> Result<Vec<Holding>> {
        let ledger = self.transactions.list()?;
        let today = Utc::now().date_naive();

        let mut tickers: Vec<&str> = ledger.iter().map(|tx| tx.ticker.as_str()).collect();
        tickers.sort_unstable();
        tickers.dedup();

        let mut holdings = Vec::new();
        for ticker in tickers {
            let shares = shares_at_date(&ledger, ticker, today);
            if shares <= Decimal::ZERO {
                continue;
            }

            let average_cost = weighted_average_cost(&ledger, ticker);
            let current_price = self
                .market_data
                .get_current_price(ticker)?
                .map(|observation| observation.price);

            let current_value = match current_price {
                Some(price) => shares * price,
                None => {
                    warn!("No current price for {}; valuing holding at zero", ticker);
                    Decimal::ZERO
                }
            };
            let total_cost = shares * average_cost;
            let unrealized_pnl = current_value - total_cost;
            let pnl_percent = if total_cost.is_zero() {
                Decimal::ZERO
            } else {
                (unrealized_pnl / total_cost * dec!(100)).round_dp(DECIMAL_PRECISION)
            };

            let name = ledger
                .iter()
                .find(|tx| tx.ticker == ticker && tx.name.is_some())
                .and_then(|tx| tx.name.clone());

            holdings.push(Holding {
                ticker: ticker.to_string(),
                name,
                shares,
                average_cost,
                current_price,
                current_value,
                total_cost,
                unrealized_pnl,
                pnl_percent,
            });
        }

        Ok(holdings)
    }

    /// Global totals, summed from the holdings breakdown so the two can
    /// never disagree.
    pub fn summary(&self) -> Result<PortfolioSummary> {
        let holdings = self.holdings()?;

        let total_value: Decimal = holdings.iter().map(|h| h.current_value).sum();
        let total_cost: Decimal = holdings.iter().map(|h| h.total_cost).sum();
        let total_pnl = total_value - total_cost;
        let pnl_percent = if total_cost.is_zero() {
            Decimal::ZERO
        } else {
            (total_pnl / total_cost * dec!(100)).round_dp(DECIMAL_PRECISION)
        };
        let total_dividends = self
            .market_data
            .get_all_dividends()?
            .iter()
            .map(|record| record.total_received)
            .sum();

        Ok(PortfolioSummary {
            total_value,
            total_cost,
            total_pnl,
            pnl_percent,
            total_dividends,
            holdings_count: holdings.len(),
        })
    }

    /// Upserts today's snapshot row. With no holdings the write is
    /// skipped and zeroed totals are returned; an all-zero row adds
    /// nothing to the time series.
    pub fn create_snapshot(&self) -> Result<PortfolioSnapshot> {
        info!("Creating portfolio snapshot...");
        let holdings = self.holdings()?;

        let now = Utc::now().naive_utc();
        let snapshot = PortfolioSnapshot {
            snapshot_date: now.date(),
            total_value: holdings.iter().map(|h| h.current_value).sum(),
            total_cost: holdings.iter().map(|h| h.total_cost).sum(),
            created_at: now,
        };

        if holdings.is_empty() {
            warn!("No holdings found for snapshot");
            return Ok(snapshot);
        }

        self.snapshots.upsert_snapshot(&snapshot)?;
        info!(
            "Snapshot created: value={}, cost={}",
            snapshot.total_value, snapshot.total_cost
        );
        Ok(snapshot)
    }

    /// Snapshot series, oldest first.
    pub fn snapshots(&self) -> Result<Vec<PortfolioSnapshot>> {
        self.snapshots.list_snapshots()
    }

    pub fn dividends_for(&self, ticker: &str) -> Result<Vec<DividendRecord>> {
        self.market_data.get_dividends_for(ticker)
    }

    pub fn all_dividends(&self) -> Result<Vec<DividendRecord>> {
        self.market_data.get_all_dividends()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::{FxRate, PriceObservation};
    use crate::transactions::{NewTransaction, Transaction, TransactionSide};
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FixedLedger {
        rows: Vec<Transaction>,
    }

    impl TransactionRepositoryTrait for FixedLedger {
        fn insert(&self, _new_transaction: NewTransaction) -> Result<Transaction> {
            unimplemented!("read-only fake")
        }

        fn exists(&self, _ticker: &str, _on: NaiveDate, _quantity: Decimal) -> Result<bool> {
            Ok(false)
        }

        fn list(&self) -> Result<Vec<Transaction>> {
            Ok(self.rows.clone())
        }

        fn list_by_ticker(&self, ticker: &str) -> Result<Vec<Transaction>> {
            Ok(self
                .rows
                .iter()
                .filter(|tx| tx.ticker == ticker)
                .cloned()
                .collect())
        }

        fn distinct_tickers(&self) -> Result<Vec<String>> {
            let mut tickers: Vec<String> = self.rows.iter().map(|tx| tx.ticker.clone()).collect();
            tickers.sort();
            tickers.dedup();
            Ok(tickers)
        }

        fn delete(&self, _id: &str) -> Result<usize> {
            Ok(0)
        }
    }

    #[derive(Default)]
    struct FixedMarketData {
        prices: HashMap<String, Decimal>,
        dividends: Vec<DividendRecord>,
    }

    impl MarketDataRepositoryTrait for FixedMarketData {
        fn upsert_current_price(&self, _observation: &PriceObservation) -> Result<()> {
            Ok(())
        }

        fn insert_price_history(&self, _observation: &PriceObservation) -> Result<()> {
            Ok(())
        }

        fn get_current_price(&self, ticker: &str) -> Result<Option<PriceObservation>> {
            Ok(self.prices.get(ticker).map(|price| PriceObservation {
                ticker: ticker.to_string(),
                price: *price,
                currency: "USD".to_string(),
                observed_at: Utc::now().naive_utc(),
            }))
        }

        fn get_current_prices(&self) -> Result<Vec<PriceObservation>> {
            Ok(Vec::new())
        }

        fn get_price_history(&self, _ticker: &str) -> Result<Vec<PriceObservation>> {
            Ok(Vec::new())
        }

        fn upsert_current_fx_rate(&self, _rate: &FxRate) -> Result<()> {
            Ok(())
        }

        fn insert_fx_rate_history(&self, _rate: &FxRate) -> Result<()> {
            Ok(())
        }

        fn get_current_fx_rates(&self) -> Result<Vec<FxRate>> {
            Ok(Vec::new())
        }

        fn upsert_dividend(&self, _record: &DividendRecord) -> Result<()> {
            Ok(())
        }

        fn get_dividends_for(&self, ticker: &str) -> Result<Vec<DividendRecord>> {
            Ok(self
                .dividends
                .iter()
                .filter(|r| r.ticker == ticker)
                .cloned()
                .collect())
        }

        fn get_all_dividends(&self) -> Result<Vec<DividendRecord>> {
            Ok(self.dividends.clone())
        }
    }

    #[derive(Default)]
    struct InMemorySnapshots {
        rows: Mutex<HashMap<NaiveDate, PortfolioSnapshot>>,
    }

    impl SnapshotRepositoryTrait for InMemorySnapshots {
        fn upsert_snapshot(&self, snapshot: &PortfolioSnapshot) -> Result<()> {
            self.rows
                .lock()
                .unwrap()
                .insert(snapshot.snapshot_date, snapshot.clone());
            Ok(())
        }

        fn list_snapshots(&self) -> Result<Vec<PortfolioSnapshot>> {
            let mut snapshots: Vec<PortfolioSnapshot> =
                self.rows.lock().unwrap().values().cloned().collect();
            snapshots.sort_by_key(|s| s.snapshot_date);
            Ok(snapshots)
        }
    }

    fn tx(ticker: &str, side: TransactionSide, quantity: Decimal, price: Decimal, day: u32) -> Transaction {
        let transacted_at = NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        Transaction {
            id: format!("{}-{}", ticker, day),
            ticker: ticker.to_string(),
            name: None,
            side,
            asset_class: None,
            quantity,
            unit_price: price,
            total_amount: quantity * price,
            currency: "USD".to_string(),
            exchange: None,
            platform: None,
            notes: None,
            transacted_at,
            created_at: transacted_at,
        }
    }

    fn service(
        rows: Vec<Transaction>,
        prices: HashMap<String, Decimal>,
    ) -> (PortfolioService, Arc<InMemorySnapshots>) {
        let snapshots = Arc::new(InMemorySnapshots::default());
        let service = PortfolioService::new(
            Arc::new(FixedLedger { rows }),
            Arc::new(FixedMarketData {
                prices,
                dividends: Vec::new(),
            }),
            snapshots.clone(),
        );
        (service, snapshots)
    }

    #[test]
    fn test_holding_valuation_example() {
        let rows = vec![
            tx("AAPL", TransactionSide::Buy, dec!(10), dec!(100), 1),
            tx("AAPL", TransactionSide::Buy, dec!(5), dec!(120), 15),
        ];
        let prices = HashMap::from([("AAPL".to_string(), dec!(150))]);
        let (service, _) = service(rows, prices);

        let holdings = service.holdings().unwrap();
        assert_eq!(holdings.len(), 1);

        let holding = &holdings[0];
        assert_eq!(holding.shares, dec!(15));
        // (10*100 + 5*120) / 15
        assert_eq!(holding.average_cost, dec!(1600) / dec!(15));
        assert_eq!(holding.current_value, dec!(2250));
        assert_eq!(holding.total_cost.round_dp(4), dec!(1600));
        assert_eq!(holding.unrealized_pnl.round_dp(4), dec!(650));
        assert_eq!(holding.pnl_percent, dec!(40.625));
    }

    #[test]
    fn test_fully_sold_position_is_not_a_holding() {
        let rows = vec![
            tx("AAPL", TransactionSide::Buy, dec!(10), dec!(100), 1),
            tx("AAPL", TransactionSide::Sell, dec!(10), dec!(140), 5),
            tx("MSFT", TransactionSide::Buy, dec!(2), dec!(300), 3),
        ];
        let prices = HashMap::from([
            ("AAPL".to_string(), dec!(150)),
            ("MSFT".to_string(), dec!(320)),
        ]);
        let (service, _) = service(rows, prices);

        let holdings = service.holdings().unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].ticker, "MSFT");
    }

    #[test]
    fn test_missing_price_degrades_to_zero_value() {
        let rows = vec![tx("MYST", TransactionSide::Buy, dec!(4), dec!(25), 1)];
        let (service, _) = service(rows, HashMap::new());

        let holdings = service.holdings().unwrap();
        let holding = &holdings[0];
        assert_eq!(holding.current_price, None);
        assert_eq!(holding.current_value, Decimal::ZERO);
        assert_eq!(holding.total_cost, dec!(100));
        assert_eq!(holding.unrealized_pnl, dec!(-100));
    }

    #[test]
    fn test_summary_totals_equal_sum_of_holdings() {
        let rows = vec![
            tx("AAPL", TransactionSide::Buy, dec!(10), dec!(100), 1),
            tx("MSFT", TransactionSide::Buy, dec!(2), dec!(300), 3),
            tx("MYST", TransactionSide::Buy, dec!(4), dec!(25), 4),
        ];
        let prices = HashMap::from([
            ("AAPL".to_string(), dec!(150)),
            ("MSFT".to_string(), dec!(320)),
        ]);
        let (service, _) = service(rows, prices);

        let holdings = service.holdings().unwrap();
        let summary = service.summary().unwrap();

        let value_sum: Decimal = holdings.iter().map(|h| h.current_value).sum();
        let cost_sum: Decimal = holdings.iter().map(|h| h.total_cost).sum();
        assert_eq!(summary.total_value, value_sum);
        assert_eq!(summary.total_cost, cost_sum);
        assert_eq!(summary.total_pnl, value_sum - cost_sum);
        assert_eq!(summary.holdings_count, 3);
    }

    #[test]
    fn test_zero_cost_basis_gives_zero_percent() {
        // Only a SELL on record: positive shares are impossible, but a
        // zero-cost holding can still appear via a zero-priced buy.
        let rows = vec![tx("FREE", TransactionSide::Buy, dec!(10), dec!(0), 1)];
        let prices = HashMap::from([("FREE".to_string(), dec!(2))]);
        let (service, _) = service(rows, prices);

        let holdings = service.holdings().unwrap();
        assert_eq!(holdings[0].pnl_percent, Decimal::ZERO);
        assert_eq!(holdings[0].current_value, dec!(20));
    }

    #[test]
    fn test_snapshot_is_idempotent_per_day() {
        let rows = vec![tx("AAPL", TransactionSide::Buy, dec!(10), dec!(100), 1)];
        let prices = HashMap::from([("AAPL".to_string(), dec!(150))]);
        let (service, snapshots) = service(rows, prices);

        let first = service.create_snapshot().unwrap();
        let second = service.create_snapshot().unwrap();

        assert_eq!(first.snapshot_date, second.snapshot_date);
        assert_eq!(snapshots.rows.lock().unwrap().len(), 1);
        assert_eq!(service.snapshots().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_portfolio_skips_the_snapshot_write() {
        let (service, snapshots) = service(Vec::new(), HashMap::new());

        let snapshot = service.create_snapshot().unwrap();

        assert_eq!(snapshot.total_value, Decimal::ZERO);
        assert_eq!(snapshot.total_cost, Decimal::ZERO);
        assert!(snapshots.rows.lock().unwrap().is_empty());
    }
}
