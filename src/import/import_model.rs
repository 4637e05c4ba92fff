use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::transactions::{NewTransaction, TransactionSide};

/// Bucket label in the summary for rows whose asset class could not be
/// recognized.
const UNKNOWN_ASSET_CLASS: &str = "UNKNOWN";

/// Everything a parse run produced: the usable rows plus the reasons each
/// dropped row was dropped.
#[derive(Debug, Default)]
pub struct ParsedImport {
    pub rows: Vec<NewTransaction>,
    pub errors: Vec<String>,
}

/// Aggregate view of a parsed file, logged before committing and printed
/// as JSON for dry runs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub total_transactions: usize,
    pub unique_tickers: Vec<String>,
    pub buy_count: usize,
    pub sell_count: usize,
    pub asset_classes: BTreeMap<String, usize>,
    pub earliest: Option<NaiveDateTime>,
    pub latest: Option<NaiveDateTime>,
}

impl ImportSummary {
    /// Summarizes parsed rows; an empty input yields the zeroed summary
    /// rather than an error.
    pub fn from_rows(rows: &[NewTransaction]) -> Self {
        let mut tickers: Vec<String> = rows.iter().map(|r| r.ticker.clone()).collect();
        tickers.sort();
        tickers.dedup();

        let buy_count = rows
            .iter()
            .filter(|r| r.side == TransactionSide::Buy)
            .count();
        let sell_count = rows.len() - buy_count;

        let mut asset_classes: BTreeMap<String, usize> = BTreeMap::new();
        for row in rows {
            let label = row
                .asset_class
                .map(|ac| ac.as_str().to_string())
                .unwrap_or_else(|| UNKNOWN_ASSET_CLASS.to_string());
            *asset_classes.entry(label).or_insert(0) += 1;
        }

        ImportSummary {
            total_transactions: rows.len(),
            unique_tickers: tickers,
            buy_count,
            sell_count,
            asset_classes,
            earliest: rows.iter().map(|r| r.transacted_at).min(),
            latest: rows.iter().map(|r| r.transacted_at).max(),
        }
    }
}

/// Result of committing parsed rows to the ledger. Row-level failures are
/// collected, never raised.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub inserted: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}
