use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::db::parse_decimal_tolerant;
use crate::schema::transactions;

/// Direction of a ledger entry. Anything else in an import file
/// (deposits, transfers, staking rewards) never reaches the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionSide {
    Buy,
    Sell,
}

impl TransactionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionSide::Buy => "BUY",
            TransactionSide::Sell => "SELL",
        }
    }
}

impl FromStr for TransactionSide {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "BUY" => Ok(TransactionSide::Buy),
            "SELL" => Ok(TransactionSide::Sell),
            other => Err(format!("unknown transaction side '{}'", other)),
        }
    }
}

impl fmt::Display for TransactionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Broad asset bucket carried through from the import file. Unrecognized
/// labels are kept as None rather than failing the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetClass {
    Stock,
    Fund,
    Crypto,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Stock => "STOCK",
            AssetClass::Fund => "FUND",
            AssetClass::Crypto => "CRYPTO",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "STOCK" => Some(AssetClass::Stock),
            "FUND" | "ETF" => Some(AssetClass::Fund),
            "CRYPTO" | "CRYPTOCURRENCY" => Some(AssetClass::Crypto),
            _ => None,
        }
    }
}

/// An immutable ledger entry. The ledger is the single source of truth;
/// holdings, snapshots and dividend eligibility are all derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub ticker: String,
    pub name: Option<String>,
    pub side: TransactionSide,
    pub asset_class: Option<AssetClass>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub exchange: Option<String>,
    pub platform: Option<String>,
    pub notes: Option<String>,
    pub transacted_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

impl Transaction {
    /// Calendar day of execution, the granularity used for dedup and
    /// point-in-time position queries.
    pub fn transacted_on(&self) -> NaiveDate {
        self.transacted_at.date()
    }
}

/// Input shape for a ledger entry, before the datastore assigns an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub ticker: String,
    pub name: Option<String>,
    pub side: TransactionSide,
    pub asset_class: Option<AssetClass>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub exchange: Option<String>,
    pub platform: Option<String>,
    pub notes: Option<String>,
    pub transacted_at: NaiveDateTime,
}

/// Database representation: money and share amounts are stored as text to
/// keep full decimal precision through SQLite.
#[derive(Queryable, Selectable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub ticker: String,
    pub name: Option<String>,
    pub side: String,
    pub asset_class: Option<String>,
    pub quantity: String,
    pub unit_price: String,
    pub total_amount: String,
    pub currency: String,
    pub exchange: Option<String>,
    pub platform: Option<String>,
    pub notes: Option<String>,
    pub transacted_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

/// Canonical string form of a share quantity, used both when writing the
/// row and when probing for duplicates, so `10.50` and `10.5` compare
/// equal.
pub fn canonical_quantity(quantity: Decimal) -> String {
    quantity.normalize().to_string()
}

impl From<TransactionDB> for Transaction {
    fn from(db: TransactionDB) -> Self {
        let side = TransactionSide::from_str(&db.side).unwrap_or_else(|e| {
            log::error!("Ledger row {}: {}. Falling back to BUY.", db.id, e);
            TransactionSide::Buy
        });
        Transaction {
            side,
            asset_class: db.asset_class.as_deref().and_then(AssetClass::parse),
            quantity: parse_decimal_tolerant(&db.quantity, "quantity"),
            unit_price: parse_decimal_tolerant(&db.unit_price, "unit_price"),
            total_amount: parse_decimal_tolerant(&db.total_amount, "total_amount"),
            id: db.id,
            ticker: db.ticker,
            name: db.name,
            currency: db.currency,
            exchange: db.exchange,
            platform: db.platform,
            notes: db.notes,
            transacted_at: db.transacted_at,
            created_at: db.created_at,
        }
    }
}

impl From<NewTransaction> for TransactionDB {
    fn from(new: NewTransaction) -> Self {
        TransactionDB {
            id: Uuid::new_v4().to_string(),
            ticker: new.ticker,
            name: new.name,
            side: new.side.as_str().to_string(),
            asset_class: new.asset_class.map(|ac| ac.as_str().to_string()),
            quantity: canonical_quantity(new.quantity),
            unit_price: new.unit_price.to_string(),
            total_amount: new.total_amount.to_string(),
            currency: new.currency,
            exchange: new.exchange,
            platform: new.platform,
            notes: new.notes,
            transacted_at: new.transacted_at,
            created_at: Utc::now().naive_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_side_parses_case_insensitive() {
        assert_eq!(TransactionSide::from_str("buy").unwrap(), TransactionSide::Buy);
        assert_eq!(TransactionSide::from_str(" SELL ").unwrap(), TransactionSide::Sell);
        assert!(TransactionSide::from_str("TRANSFER").is_err());
    }

    #[test]
    fn test_asset_class_parse() {
        assert_eq!(AssetClass::parse("stock"), Some(AssetClass::Stock));
        assert_eq!(AssetClass::parse("ETF"), Some(AssetClass::Fund));
        assert_eq!(AssetClass::parse("weird"), None);
    }

    #[test]
    fn test_canonical_quantity_strips_trailing_zeros() {
        assert_eq!(canonical_quantity(dec!(10.50)), "10.5");
        assert_eq!(canonical_quantity(dec!(10.5)), "10.5");
        assert_eq!(canonical_quantity(dec!(0.00129870)), "0.0012987");
    }

    #[test]
    fn test_db_round_trip_preserves_amounts() {
        let new = NewTransaction {
            ticker: "AAPL".to_string(),
            name: Some("Apple Inc".to_string()),
            side: TransactionSide::Buy,
            asset_class: Some(AssetClass::Stock),
            quantity: dec!(10),
            unit_price: dec!(150.25),
            total_amount: dec!(1502.50),
            currency: "USD".to_string(),
            exchange: None,
            platform: None,
            notes: None,
            transacted_at: chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
        };

        let db = TransactionDB::from(new);
        assert_eq!(db.side, "BUY");
        assert_eq!(db.quantity, "10");

        let domain = Transaction::from(db);
        assert_eq!(domain.quantity, dec!(10));
        assert_eq!(domain.unit_price, dec!(150.25));
        assert_eq!(domain.transacted_on(), chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }
}
