use log::info;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::transactions_model::{NewTransaction, Transaction};
use super::transactions_traits::TransactionRepositoryTrait;
use crate::constants::MANUAL_PLATFORM;
use crate::errors::{Error, Result, ValidationError};

/// Ledger maintenance entry points used by the display layer: validated
/// manual entries, corrections, and read queries.
pub struct TransactionService {
    repository: Arc<dyn TransactionRepositoryTrait>,
}

impl TransactionService {
    pub fn new(repository: Arc<dyn TransactionRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// Validates and appends a manually entered transaction. Manual rows
    /// must carry a positive quantity and unit price.
    pub fn add_transaction(&self, mut new_transaction: NewTransaction) -> Result<Transaction> {
        let ticker = new_transaction.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "ticker".to_string(),
            )));
        }
        if new_transaction.quantity <= Decimal::ZERO {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "quantity must be positive, got {}",
                new_transaction.quantity
            ))));
        }
        if new_transaction.unit_price <= Decimal::ZERO {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "unit price must be positive, got {}",
                new_transaction.unit_price
            ))));
        }

        new_transaction.ticker = ticker;
        if new_transaction.platform.is_none() {
            new_transaction.platform = Some(MANUAL_PLATFORM.to_string());
        }

        let transaction = self.repository.insert(new_transaction)?;
        info!(
            "Recorded {} {} {} @ {} {}",
            transaction.side,
            transaction.quantity,
            transaction.ticker,
            transaction.unit_price,
            transaction.currency
        );
        Ok(transaction)
    }

    /// Removes one ledger entry by id.
    pub fn delete_transaction(&self, id: &str) -> Result<()> {
        let deleted = self.repository.delete(id)?;
        if deleted == 0 {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "no transaction with id '{}'",
                id
            ))));
        }
        info!("Deleted transaction {}", id);
        Ok(())
    }

    pub fn get_transactions(&self) -> Result<Vec<Transaction>> {
        self.repository.list()
    }

    pub fn get_transactions_for(&self, ticker: &str) -> Result<Vec<Transaction>> {
        self.repository.list_by_ticker(ticker)
    }

    pub fn get_tickers(&self) -> Result<Vec<String>> {
        self.repository.distinct_tickers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transactions::transactions_model::TransactionSide;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    struct FakeRepository {
        inserted: Mutex<Vec<NewTransaction>>,
        delete_hits: usize,
    }

    impl FakeRepository {
        fn new(delete_hits: usize) -> Self {
            Self {
                inserted: Mutex::new(Vec::new()),
                delete_hits,
            }
        }
    }

    impl TransactionRepositoryTrait for FakeRepository {
        fn insert(&self, new_transaction: NewTransaction) -> Result<Transaction> {
            let transaction = Transaction {
                id: "t-1".to_string(),
                ticker: new_transaction.ticker.clone(),
                name: new_transaction.name.clone(),
                side: new_transaction.side,
                asset_class: new_transaction.asset_class,
                quantity: new_transaction.quantity,
                unit_price: new_transaction.unit_price,
                total_amount: new_transaction.total_amount,
                currency: new_transaction.currency.clone(),
                exchange: new_transaction.exchange.clone(),
                platform: new_transaction.platform.clone(),
                notes: new_transaction.notes.clone(),
                transacted_at: new_transaction.transacted_at,
                created_at: new_transaction.transacted_at,
            };
            self.inserted.lock().unwrap().push(new_transaction);
            Ok(transaction)
        }

        fn exists(&self, _ticker: &str, _on: NaiveDate, _quantity: Decimal) -> Result<bool> {
            Ok(false)
        }

        fn list(&self) -> Result<Vec<Transaction>> {
            Ok(Vec::new())
        }

        fn list_by_ticker(&self, _ticker: &str) -> Result<Vec<Transaction>> {
            Ok(Vec::new())
        }

        fn distinct_tickers(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn delete(&self, _id: &str) -> Result<usize> {
            Ok(self.delete_hits)
        }
    }

    fn sample_entry(quantity: Decimal, unit_price: Decimal) -> NewTransaction {
        NewTransaction {
            ticker: "aapl".to_string(),
            name: None,
            side: TransactionSide::Buy,
            asset_class: None,
            quantity,
            unit_price,
            total_amount: quantity * unit_price,
            currency: "USD".to_string(),
            exchange: None,
            platform: None,
            notes: None,
            transacted_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_add_transaction_uppercases_and_tags_platform() {
        let repository = Arc::new(FakeRepository::new(1));
        let service = TransactionService::new(repository.clone());

        let transaction = service.add_transaction(sample_entry(dec!(10), dec!(100))).unwrap();

        assert_eq!(transaction.ticker, "AAPL");
        let stored = repository.inserted.lock().unwrap();
        assert_eq!(stored[0].platform.as_deref(), Some(MANUAL_PLATFORM));
    }

    #[test]
    fn test_add_transaction_rejects_non_positive_amounts() {
        let service = TransactionService::new(Arc::new(FakeRepository::new(1)));

        assert!(service.add_transaction(sample_entry(dec!(0), dec!(100))).is_err());
        assert!(service.add_transaction(sample_entry(dec!(1), dec!(0))).is_err());
        assert!(service.add_transaction(sample_entry(dec!(-2), dec!(5))).is_err());
    }

    #[test]
    fn test_delete_missing_transaction_is_an_error() {
        let service = TransactionService::new(Arc::new(FakeRepository::new(0)));
        assert!(service.delete_transaction("nope").is_err());
    }
}
