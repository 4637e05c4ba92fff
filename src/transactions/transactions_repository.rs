use chrono::{Duration, NaiveDate, NaiveTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::transactions_model::{canonical_quantity, NewTransaction, Transaction, TransactionDB};
use super::transactions_traits::TransactionRepositoryTrait;
use crate::db::{get_connection, DbPool};
use crate::errors::Result;
use crate::schema::transactions;

/// Diesel/SQLite implementation of the ledger store.
pub struct TransactionRepository {
    pool: Arc<DbPool>,
}

impl TransactionRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl TransactionRepositoryTrait for TransactionRepository {
    fn insert(&self, new_transaction: NewTransaction) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;

        let db_row = TransactionDB::from(new_transaction);
        diesel::insert_into(transactions::table)
            .values(&db_row)
            .execute(&mut conn)?;

        Ok(Transaction::from(db_row))
    }

    fn exists(&self, ticker: &str, on: NaiveDate, quantity: Decimal) -> Result<bool> {
        let mut conn = get_connection(&self.pool)?;

        let day_start = on.and_time(NaiveTime::MIN);
        let day_end = (on + Duration::days(1)).and_time(NaiveTime::MIN);

        let count: i64 = transactions::table
            .filter(transactions::ticker.eq(ticker))
            .filter(transactions::transacted_at.ge(day_start))
            .filter(transactions::transacted_at.lt(day_end))
            .filter(transactions::quantity.eq(canonical_quantity(quantity)))
            .count()
            .get_result(&mut conn)?;

        Ok(count > 0)
    }

    fn list(&self) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = transactions::table
            .select(TransactionDB::as_select())
            .order(transactions::transacted_at.desc())
            .load::<TransactionDB>(&mut conn)?;

        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    fn list_by_ticker(&self, ticker: &str) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = transactions::table
            .filter(transactions::ticker.eq(ticker))
            .select(TransactionDB::as_select())
            .order(transactions::transacted_at.asc())
            .load::<TransactionDB>(&mut conn)?;

        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    fn distinct_tickers(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;

        let tickers = transactions::table
            .select(transactions::ticker)
            .distinct()
            .order(transactions::ticker.asc())
            .load::<String>(&mut conn)?;

        Ok(tickers)
    }

    fn delete(&self, id: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;

        let deleted = diesel::delete(transactions::table.find(id)).execute(&mut conn)?;

        Ok(deleted)
    }
}
