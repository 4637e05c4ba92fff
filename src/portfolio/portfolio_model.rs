use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::parse_decimal_tolerant;
use crate::schema::portfolio_snapshots;

/// Current aggregate state for one ticker, derived from the ledger and
/// the latest fetched price. Never persisted as a source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub ticker: String,
    pub name: Option<String>,
    pub shares: Decimal,
    pub average_cost: Decimal,
    /// None when the last refresh produced no price for this ticker.
    pub current_price: Option<Decimal>,
    /// Zero when no price is available; a stale holding degrades to a
    /// visible zero contribution, it never breaks aggregation.
    pub current_value: Decimal,
    pub total_cost: Decimal,
    pub unrealized_pnl: Decimal,
    pub pnl_percent: Decimal,
}

/// Whole-portfolio totals. Always the sum of the holdings breakdown,
/// never an independently sourced number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub total_pnl: Decimal,
    pub pnl_percent: Decimal,
    pub total_dividends: Decimal,
    pub holdings_count: usize,
}

/// One row of the portfolio value time series, keyed by calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub snapshot_date: NaiveDate,
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = portfolio_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PortfolioSnapshotDB {
    pub snapshot_date: String,
    pub total_value: String,
    pub total_cost: String,
    pub created_at: NaiveDateTime,
}

impl From<&PortfolioSnapshot> for PortfolioSnapshotDB {
    fn from(snapshot: &PortfolioSnapshot) -> Self {
        PortfolioSnapshotDB {
            snapshot_date: snapshot.snapshot_date.format("%Y-%m-%d").to_string(),
            total_value: snapshot.total_value.to_string(),
            total_cost: snapshot.total_cost.to_string(),
            created_at: snapshot.created_at,
        }
    }
}

impl From<PortfolioSnapshotDB> for PortfolioSnapshot {
    fn from(db: PortfolioSnapshotDB) -> Self {
        let snapshot_date = NaiveDate::parse_from_str(&db.snapshot_date, "%Y-%m-%d")
            .unwrap_or_else(|e| {
                log::error!(
                    "Snapshot row: bad date '{}' ({}). Using the recorded date.",
                    db.snapshot_date,
                    e
                );
                db.created_at.date()
            });
        PortfolioSnapshot {
            snapshot_date,
            total_value: parse_decimal_tolerant(&db.total_value, "total_value"),
            total_cost: parse_decimal_tolerant(&db.total_cost, "total_cost"),
            created_at: db.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_snapshot_db_round_trip() {
        let snapshot = PortfolioSnapshot {
            snapshot_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            total_value: dec!(12500.75),
            total_cost: dec!(10000),
            created_at: NaiveDate::from_ymd_opt(2024, 7, 1)
                .unwrap()
                .and_hms_opt(18, 0, 0)
                .unwrap(),
        };

        let db = PortfolioSnapshotDB::from(&snapshot);
        assert_eq!(db.snapshot_date, "2024-07-01");

        let back = PortfolioSnapshot::from(db);
        assert_eq!(back.snapshot_date, snapshot.snapshot_date);
        assert_eq!(back.total_value, dec!(12500.75));
        assert_eq!(back.total_cost, dec!(10000));
    }
}
