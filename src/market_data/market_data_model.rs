use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::parse_decimal_tolerant;
use crate::schema::{current_fx_rates, current_prices, dividends, fx_rate_history, price_history};

/// One market data sample for a ticker. The same shape serves the
/// single-row-per-ticker "current" cache and the append-only history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceObservation {
    pub ticker: String,
    pub price: Decimal,
    pub currency: String,
    pub observed_at: NaiveDateTime,
}

/// An exchange rate sample, keyed by currency pair instead of ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxRate {
    pub base: String,
    pub quote: String,
    pub rate: Decimal,
    pub observed_at: NaiveDateTime,
}

impl FxRate {
    /// Pair key in `BASE/QUOTE` form, e.g. `USD/CLP`.
    pub fn pair(&self) -> String {
        fx_pair(&self.base, &self.quote)
    }
}

pub fn fx_pair(base: &str, quote: &str) -> String {
    format!("{}/{}", base, quote)
}

/// A dividend event as reported by the market data provider, before it is
/// weighted by the shares held.
#[derive(Debug, Clone, PartialEq)]
pub struct DividendEvent {
    pub date: NaiveDate,
    pub amount_per_share: Decimal,
}

/// One dividend payment attributed to a ticker, weighted by the position
/// held on the payment date. Keyed by (ticker, payment date), so
/// re-fetching history overwrites instead of duplicating.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendRecord {
    pub ticker: String,
    pub payment_date: NaiveDate,
    pub amount_per_share: Decimal,
    pub shares_held: Decimal,
    pub total_received: Decimal,
    pub currency: String,
    pub recorded_at: NaiveDateTime,
}

/// Outcome of a batch price refresh. Failed tickers are reported, never
/// raised; one dead symbol must not take down the cycle.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdateReport {
    pub updated: usize,
    pub failed_tickers: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FxUpdateReport {
    pub updated: usize,
    pub failed_pairs: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendUpdateReport {
    pub records_written: usize,
    pub tickers_with_dividends: usize,
}

// ---------------------------------------------------------------------------
// Database rows. Amounts travel as text through SQLite.

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = current_prices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CurrentPriceDB {
    pub ticker: String,
    pub price: String,
    pub currency: String,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = price_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceHistoryDB {
    pub id: String,
    pub ticker: String,
    pub price: String,
    pub currency: String,
    pub recorded_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = current_fx_rates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CurrentFxRateDB {
    pub pair: String,
    pub rate: String,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = fx_rate_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FxRateHistoryDB {
    pub id: String,
    pub pair: String,
    pub rate: String,
    pub recorded_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = dividends)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DividendDB {
    pub id: String,
    pub ticker: String,
    pub payment_date: String,
    pub amount_per_share: String,
    pub shares_held: String,
    pub total_received: String,
    pub currency: String,
    pub recorded_at: NaiveDateTime,
}

impl From<&PriceObservation> for CurrentPriceDB {
    fn from(observation: &PriceObservation) -> Self {
        CurrentPriceDB {
            ticker: observation.ticker.clone(),
            price: observation.price.to_string(),
            currency: observation.currency.clone(),
            updated_at: observation.observed_at,
        }
    }
}

impl From<&PriceObservation> for PriceHistoryDB {
    fn from(observation: &PriceObservation) -> Self {
        PriceHistoryDB {
            id: Uuid::new_v4().to_string(),
            ticker: observation.ticker.clone(),
            price: observation.price.to_string(),
            currency: observation.currency.clone(),
            recorded_at: observation.observed_at,
        }
    }
}

impl From<CurrentPriceDB> for PriceObservation {
    fn from(db: CurrentPriceDB) -> Self {
        PriceObservation {
            price: parse_decimal_tolerant(&db.price, "price"),
            ticker: db.ticker,
            currency: db.currency,
            observed_at: db.updated_at,
        }
    }
}

impl From<PriceHistoryDB> for PriceObservation {
    fn from(db: PriceHistoryDB) -> Self {
        PriceObservation {
            price: parse_decimal_tolerant(&db.price, "price"),
            ticker: db.ticker,
            currency: db.currency,
            observed_at: db.recorded_at,
        }
    }
}

impl From<&FxRate> for CurrentFxRateDB {
    fn from(rate: &FxRate) -> Self {
        CurrentFxRateDB {
            pair: rate.pair(),
            rate: rate.rate.to_string(),
            updated_at: rate.observed_at,
        }
    }
}

impl From<&FxRate> for FxRateHistoryDB {
    fn from(rate: &FxRate) -> Self {
        FxRateHistoryDB {
            id: Uuid::new_v4().to_string(),
            pair: rate.pair(),
            rate: rate.rate.to_string(),
            recorded_at: rate.observed_at,
        }
    }
}

impl From<CurrentFxRateDB> for FxRate {
    fn from(db: CurrentFxRateDB) -> Self {
        let (base, quote) = match db.pair.split_once('/') {
            Some((base, quote)) => (base.to_string(), quote.to_string()),
            None => {
                log::error!("Malformed FX pair key '{}'", db.pair);
                (db.pair.clone(), String::new())
            }
        };
        FxRate {
            base,
            quote,
            rate: parse_decimal_tolerant(&db.rate, "rate"),
            observed_at: db.updated_at,
        }
    }
}

/// Deterministic dividend row id, one per (ticker, payment date).
pub fn dividend_id(ticker: &str, payment_date: NaiveDate) -> String {
    format!("{}_{}", ticker, payment_date.format("%Y-%m-%d"))
}

impl From<&DividendRecord> for DividendDB {
    fn from(record: &DividendRecord) -> Self {
        DividendDB {
            id: dividend_id(&record.ticker, record.payment_date),
            ticker: record.ticker.clone(),
            payment_date: record.payment_date.format("%Y-%m-%d").to_string(),
            amount_per_share: record.amount_per_share.to_string(),
            shares_held: record.shares_held.to_string(),
            total_received: record.total_received.to_string(),
            currency: record.currency.clone(),
            recorded_at: record.recorded_at,
        }
    }
}

impl From<DividendDB> for DividendRecord {
    fn from(db: DividendDB) -> Self {
        let payment_date = NaiveDate::parse_from_str(&db.payment_date, "%Y-%m-%d")
            .unwrap_or_else(|e| {
                log::error!(
                    "Dividend row {}: bad payment date '{}' ({}). Using the recorded date.",
                    db.id,
                    db.payment_date,
                    e
                );
                db.recorded_at.date()
            });
        DividendRecord {
            payment_date,
            amount_per_share: parse_decimal_tolerant(&db.amount_per_share, "amount_per_share"),
            shares_held: parse_decimal_tolerant(&db.shares_held, "shares_held"),
            total_received: parse_decimal_tolerant(&db.total_received, "total_received"),
            ticker: db.ticker,
            currency: db.currency,
            recorded_at: db.recorded_at,
        }
    }
}
