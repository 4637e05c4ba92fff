use log::{debug, info};
use std::sync::Arc;

use super::import_model::ImportOutcome;
use crate::transactions::{NewTransaction, TransactionRepositoryTrait};

/// Commits parsed rows to the ledger, skipping duplicates.
///
/// A row is a duplicate when an entry with the same ticker, execution day
/// and quantity already exists. One failed insert never stops the batch;
/// it is recorded in the outcome and the next row is tried.
pub struct ImportService {
    repository: Arc<dyn TransactionRepositoryTrait>,
}

impl ImportService {
    pub fn new(repository: Arc<dyn TransactionRepositoryTrait>) -> Self {
        Self { repository }
    }

    pub fn import_transactions(&self, rows: Vec<NewTransaction>) -> ImportOutcome {
        let mut outcome = ImportOutcome::default();

        for row in rows {
            let ticker = row.ticker.clone();
            let day = row.transacted_at.date();

            match self.repository.exists(&ticker, day, row.quantity) {
                Ok(true) => {
                    debug!("Skipping duplicate: {} {} on {}", ticker, row.quantity, day);
                    outcome.skipped += 1;
                }
                Ok(false) => match self.repository.insert(row) {
                    Ok(_) => outcome.inserted += 1,
                    Err(e) => outcome
                        .errors
                        .push(format!("{} on {}: {}", ticker, day, e)),
                },
                Err(e) => outcome
                    .errors
                    .push(format!("{} on {}: duplicate check failed: {}", ticker, day, e)),
            }
        }

        info!(
            "Import finished: {} inserted, {} skipped, {} error(s)",
            outcome.inserted,
            outcome.skipped,
            outcome.errors.len()
        );
        outcome
    }
}
