use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::transactions_model::{NewTransaction, Transaction};
use crate::errors::Result;

/// Datastore operations the ledger depends on. Kept behind a trait so the
/// import and portfolio services can be exercised against an in-memory
/// fake.
pub trait TransactionRepositoryTrait: Send + Sync {
    /// Appends one entry and returns it with its assigned id.
    fn insert(&self, new_transaction: NewTransaction) -> Result<Transaction>;

    /// True when an entry with the same ticker, execution day and quantity
    /// is already on the ledger. Quantity is compared in canonical form.
    fn exists(&self, ticker: &str, on: NaiveDate, quantity: Decimal) -> Result<bool>;

    /// Full ledger, newest first.
    fn list(&self) -> Result<Vec<Transaction>>;

    /// One ticker's entries, oldest first.
    fn list_by_ticker(&self, ticker: &str) -> Result<Vec<Transaction>>;

    /// Every ticker that appears anywhere on the ledger, sorted.
    fn distinct_tickers(&self) -> Result<Vec<String>>;

    /// Removes one entry (ledger correction). Returns the number of rows
    /// deleted.
    fn delete(&self, id: &str) -> Result<usize>;
}
