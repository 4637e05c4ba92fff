use csv::{ReaderBuilder, StringRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use super::import_errors::ImportError;
use super::import_model::ParsedImport;
use crate::constants::{DECIMAL_PRECISION, DEFAULT_CURRENCY, IMPORT_PLATFORM, MAX_LOGGED_PARSE_ERRORS};
use crate::errors::Result;
use crate::transactions::{AssetClass, NewTransaction, TransactionSide};

// Column headers as the Delta app writes them
const COL_DATE: &str = "Date";
const COL_WAY: &str = "Way";
const COL_QUANTITY: &str = "Base amount";
const COL_SYMBOL: &str = "Base currency (name)";
const COL_ASSET_TYPE: &str = "Base type";
const COL_TOTAL: &str = "Quote amount";
const COL_CURRENCY: &str = "Quote currency";
const COL_EXCHANGE: &str = "Exchange";
const COL_NOTES: &str = "Notes";

lazy_static! {
    /// `SYMBOL (Display Name)`; the symbol part allows uppercase letters,
    /// digits, hyphen and dot.
    static ref SYMBOL_WITH_NAME: Regex =
        Regex::new(r"^([A-Z0-9\-\.]+)\s*\((.+)\)$").expect("valid regex");
}

/// Parses a Delta portfolio export from a file path. Only the file read
/// itself can fail hard; everything else degrades to row errors.
pub fn parse_delta_file(path: &Path) -> Result<ParsedImport> {
    let content = std::fs::read(path).map_err(|e| ImportError::FileRead {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_delta_export(&content)
}

/// Parses raw Delta CSV bytes into ledger-ready rows.
///
/// Re-parsing the same bytes always yields identical output; nothing here
/// touches the datastore. Rows that are not BUY or SELL (deposits,
/// transfers, rewards) are skipped without comment. Rows that are trades
/// but cannot be read are dropped with a recorded reason, and parsing
/// continues to the end of the file.
pub fn parse_delta_export(content: &[u8]) -> Result<ParsedImport> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let headers = reader
        .headers()
        .map_err(|e| ImportError::Malformed(e.to_string()))?;
    let columns: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.trim().to_string(), idx))
        .collect();

    let mut parsed = ParsedImport::default();

    for (idx, record) in reader.records().enumerate() {
        // Header occupies line 1
        let row_number = idx + 2;

        let record = match record {
            Ok(record) => record,
            Err(e) => {
                parsed
                    .errors
                    .push(format!("Row {}: unreadable record ({})", row_number, e));
                continue;
            }
        };

        match parse_record(&record, &columns, row_number) {
            Ok(Some(row)) => parsed.rows.push(row),
            Ok(None) => {} // not a trade
            Err(reason) => parsed.errors.push(reason),
        }
    }

    if !parsed.errors.is_empty() {
        warn!(
            "{} row(s) could not be imported:",
            parsed.errors.len()
        );
        for error in parsed.errors.iter().take(MAX_LOGGED_PARSE_ERRORS) {
            warn!("  {}", error);
        }
        if parsed.errors.len() > MAX_LOGGED_PARSE_ERRORS {
            warn!(
                "  ... and {} more",
                parsed.errors.len() - MAX_LOGGED_PARSE_ERRORS
            );
        }
    }

    Ok(parsed)
}

fn field<'r>(record: &'r StringRecord, columns: &HashMap<String, usize>, name: &str) -> &'r str {
    columns
        .get(name)
        .and_then(|&idx| record.get(idx))
        .unwrap_or("")
        .trim()
}

fn optional_field(
    record: &StringRecord,
    columns: &HashMap<String, usize>,
    name: &str,
) -> Option<String> {
    let value = field(record, columns, name);
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// One record: `Ok(None)` when the row is not a trade, `Err(reason)` when
/// it is a trade but unusable.
fn parse_record(
    record: &StringRecord,
    columns: &HashMap<String, usize>,
    row_number: usize,
) -> std::result::Result<Option<NewTransaction>, String> {
    let side = match TransactionSide::from_str(field(record, columns, COL_WAY)) {
        Ok(side) => side,
        Err(_) => return Ok(None),
    };

    let symbol_field = field(record, columns, COL_SYMBOL);
    if symbol_field.is_empty() {
        return Err(format!("Row {}: missing symbol field", row_number));
    }
    let (ticker, name) = split_symbol_field(symbol_field);

    let date_field = field(record, columns, COL_DATE);
    if date_field.is_empty() {
        return Err(format!("Row {}: missing date", row_number));
    }
    let transacted_at = parse_timestamp(date_field)
        .ok_or_else(|| format!("Row {}: invalid date '{}'", row_number, date_field))?;

    let quantity_field = field(record, columns, COL_QUANTITY);
    let quantity = Decimal::from_str(quantity_field)
        .map_err(|_| format!("Row {}: invalid quantity '{}'", row_number, quantity_field))?;
    if quantity <= Decimal::ZERO {
        return Err(format!(
            "Row {}: quantity must be positive, got '{}'",
            row_number, quantity_field
        ));
    }

    let total_field = field(record, columns, COL_TOTAL);
    let total = Decimal::from_str(total_field)
        .map_err(|_| format!("Row {}: invalid amount '{}'", row_number, total_field))?;

    // The file's own price column, when present, is ignored: the stored
    // unit price is always total divided by quantity.
    let unit_price = (total / quantity).round_dp(DECIMAL_PRECISION);
    let total_amount = total.round_dp(DECIMAL_PRECISION);

    let currency = match field(record, columns, COL_CURRENCY) {
        "" => DEFAULT_CURRENCY.to_string(),
        value => value.to_string(),
    };

    Ok(Some(NewTransaction {
        ticker,
        name,
        side,
        asset_class: AssetClass::parse(field(record, columns, COL_ASSET_TYPE)),
        quantity,
        unit_price,
        total_amount,
        currency,
        exchange: optional_field(record, columns, COL_EXCHANGE),
        platform: Some(IMPORT_PLATFORM.to_string()),
        notes: optional_field(record, columns, COL_NOTES),
        transacted_at,
    }))
}

/// Splits `SYMBOL (Display Name)` into its parts. A field that does not
/// match the pattern is taken whole as the symbol, with no name; this
/// never fails the row.
fn split_symbol_field(raw: &str) -> (String, Option<String>) {
    match SYMBOL_WITH_NAME.captures(raw) {
        Some(captures) => (
            captures[1].to_string(),
            Some(captures[2].trim().to_string()),
        ),
        None => (raw.to_string(), None),
    }
}

/// Accepts RFC 3339, a naive ISO timestamp (with either separator), or a
/// bare date.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HEADER: &str = "Date,Way,Base amount,Base currency (name),Base type,Quote amount,Quote currency,Exchange,Notes\n";

    fn parse(rows: &str) -> ParsedImport {
        let content = format!("{}{}", HEADER, rows);
        parse_delta_export(content.as_bytes()).unwrap()
    }

    #[test]
    fn test_parses_buy_row() {
        let parsed = parse("2024-01-01T10:30:00Z,BUY,10,AAPL (Apple Inc),STOCK,1000,USD,NASDAQ,first buy\n");

        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows.len(), 1);
        let row = &parsed.rows[0];
        assert_eq!(row.ticker, "AAPL");
        assert_eq!(row.name.as_deref(), Some("Apple Inc"));
        assert_eq!(row.side, TransactionSide::Buy);
        assert_eq!(row.quantity, dec!(10));
        assert_eq!(row.unit_price, dec!(100));
        assert_eq!(row.total_amount, dec!(1000));
        assert_eq!(row.currency, "USD");
        assert_eq!(row.exchange.as_deref(), Some("NASDAQ"));
        assert_eq!(row.platform.as_deref(), Some(IMPORT_PLATFORM));
    }

    #[test]
    fn test_non_trade_rows_are_skipped_silently() {
        let parsed = parse(
            "2024-01-01T10:30:00Z,DEPOSIT,100,USD,FIAT,100,USD,,\n\
             2024-01-02T10:30:00Z,TRANSFER,1,BTC (Bitcoin),CRYPTO,40000,USD,,\n\
             2024-01-03T10:30:00Z,sell,2,ETH (Ethereum),CRYPTO,5000,USD,,\n",
        );

        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].side, TransactionSide::Sell);
    }

    #[test]
    fn test_symbol_without_name_is_kept_whole() {
        let parsed = parse("2024-01-01,BUY,5,XYZ,STOCK,50,USD,,\n");

        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows[0].ticker, "XYZ");
        assert_eq!(parsed.rows[0].name, None);
    }

    #[test]
    fn test_price_is_derived_and_rounded() {
        let parsed = parse("2024-01-01,BUY,3,AAPL (Apple Inc),STOCK,100,USD,,\n");

        // 100 / 3 rounded to 4 decimal places
        assert_eq!(parsed.rows[0].unit_price, dec!(33.3333));
    }

    #[test]
    fn test_bad_date_drops_row_with_error() {
        let parsed = parse(
            "not-a-date,BUY,10,AAPL (Apple Inc),STOCK,1000,USD,,\n\
             2024-01-02,BUY,1,MSFT (Microsoft),STOCK,400,USD,,\n",
        );

        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.errors[0].starts_with("Row 2"));
        assert!(parsed.errors[0].contains("invalid date"));
    }

    #[test]
    fn test_zero_quantity_drops_row_with_error() {
        let parsed = parse("2024-01-01,BUY,0,AAPL (Apple Inc),STOCK,1000,USD,,\n");

        assert!(parsed.rows.is_empty());
        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.errors[0].contains("quantity must be positive"));
    }

    #[test]
    fn test_non_numeric_amount_drops_row_with_error() {
        let parsed = parse("2024-01-01,BUY,ten,AAPL (Apple Inc),STOCK,1000,USD,,\n");

        assert!(parsed.rows.is_empty());
        assert!(parsed.errors[0].contains("invalid quantity"));
    }

    #[test]
    fn test_blank_currency_defaults_to_usd() {
        let parsed = parse("2024-01-01,BUY,1,VOO (Vanguard S&P 500),FUND,400,,,\n");

        assert_eq!(parsed.rows[0].currency, "USD");
    }

    #[test]
    fn test_reparse_is_identical() {
        let content = format!(
            "{}{}",
            HEADER, "2024-01-01T10:30:00Z,BUY,10,AAPL (Apple Inc),STOCK,1000,USD,,\n"
        );

        let first = parse_delta_export(content.as_bytes()).unwrap();
        let second = parse_delta_export(content.as_bytes()).unwrap();

        assert_eq!(first.rows.len(), second.rows.len());
        assert_eq!(first.rows[0].unit_price, second.rows[0].unit_price);
        assert_eq!(first.rows[0].transacted_at, second.rows[0].transacted_at);
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(parse_timestamp("2024-01-01T10:30:00Z").is_some());
        assert!(parse_timestamp("2024-01-01T10:30:00+02:00").is_some());
        assert!(parse_timestamp("2024-01-01T10:30:00").is_some());
        assert!(parse_timestamp("2024-01-01 10:30:00").is_some());
        assert!(parse_timestamp("2024-01-01").is_some());
        assert!(parse_timestamp("01/02/2024").is_none());
    }

    #[test]
    fn test_empty_input_parses_to_nothing() {
        let parsed = parse_delta_export(b"").unwrap();
        assert!(parsed.rows.is_empty());
        assert!(parsed.errors.is_empty());
    }
}
