use diesel::prelude::*;
use std::sync::Arc;

use super::market_data_model::{
    CurrentFxRateDB, CurrentPriceDB, DividendDB, DividendRecord, FxRate, FxRateHistoryDB,
    PriceHistoryDB, PriceObservation,
};
use super::market_data_traits::MarketDataRepositoryTrait;
use crate::db::{get_connection, DbPool};
use crate::errors::Result;
use crate::schema::{current_fx_rates, current_prices, dividends, fx_rate_history, price_history};

/// Diesel/SQLite implementation of the price, FX and dividend stores.
pub struct MarketDataRepository {
    pool: Arc<DbPool>,
}

impl MarketDataRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl MarketDataRepositoryTrait for MarketDataRepository {
    fn upsert_current_price(&self, observation: &PriceObservation) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        diesel::replace_into(current_prices::table)
            .values(CurrentPriceDB::from(observation))
            .execute(&mut conn)?;

        Ok(())
    }

    fn insert_price_history(&self, observation: &PriceObservation) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        diesel::insert_into(price_history::table)
            .values(PriceHistoryDB::from(observation))
            .execute(&mut conn)?;

        Ok(())
    }

    fn get_current_price(&self, ticker: &str) -> Result<Option<PriceObservation>> {
        let mut conn = get_connection(&self.pool)?;

        let row = current_prices::table
            .find(ticker)
            .select(CurrentPriceDB::as_select())
            .first::<CurrentPriceDB>(&mut conn)
            .optional()?;

        Ok(row.map(PriceObservation::from))
    }

    fn get_current_prices(&self) -> Result<Vec<PriceObservation>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = current_prices::table
            .select(CurrentPriceDB::as_select())
            .order(current_prices::ticker.asc())
            .load::<CurrentPriceDB>(&mut conn)?;

        Ok(rows.into_iter().map(PriceObservation::from).collect())
    }

    fn get_price_history(&self, ticker: &str) -> Result<Vec<PriceObservation>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = price_history::table
            .filter(price_history::ticker.eq(ticker))
            .select(PriceHistoryDB::as_select())
            .order(price_history::recorded_at.asc())
            .load::<PriceHistoryDB>(&mut conn)?;

        Ok(rows.into_iter().map(PriceObservation::from).collect())
    }

    fn upsert_current_fx_rate(&self, rate: &FxRate) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        diesel::replace_into(current_fx_rates::table)
            .values(CurrentFxRateDB::from(rate))
            .execute(&mut conn)?;

        Ok(())
    }

    fn insert_fx_rate_history(&self, rate: &FxRate) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        diesel::insert_into(fx_rate_history::table)
            .values(FxRateHistoryDB::from(rate))
            .execute(&mut conn)?;

        Ok(())
    }

    fn get_current_fx_rates(&self) -> Result<Vec<FxRate>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = current_fx_rates::table
            .select(CurrentFxRateDB::as_select())
            .order(current_fx_rates::pair.asc())
            .load::<CurrentFxRateDB>(&mut conn)?;

        Ok(rows.into_iter().map(FxRate::from).collect())
    }

    fn upsert_dividend(&self, record: &DividendRecord) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        // The row id is derived from (ticker, payment date), so a re-fetch
        // of the same event replaces the existing row.
        diesel::replace_into(dividends::table)
            .values(DividendDB::from(record))
            .execute(&mut conn)?;

        Ok(())
    }

    fn get_dividends_for(&self, ticker: &str) -> Result<Vec<DividendRecord>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = dividends::table
            .filter(dividends::ticker.eq(ticker))
            .select(DividendDB::as_select())
            .order(dividends::payment_date.asc())
            .load::<DividendDB>(&mut conn)?;

        Ok(rows.into_iter().map(DividendRecord::from).collect())
    }

    fn get_all_dividends(&self) -> Result<Vec<DividendRecord>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = dividends::table
            .select(DividendDB::as_select())
            .order((dividends::ticker.asc(), dividends::payment_date.asc()))
            .load::<DividendDB>(&mut conn)?;

        Ok(rows.into_iter().map(DividendRecord::from).collect())
    }
}
