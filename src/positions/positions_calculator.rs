use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::transactions::{Transaction, TransactionSide};

/// Shares of `ticker` held at the end of `as_of`.
///
/// A signed sum of the ticker's quantities with execution date on or
/// before the cutoff: BUY adds, SELL subtracts. The sum is
/// order-invariant, so the ledger slice can arrive in any order. A
/// negative result (sells recorded without the matching buys, e.g. assets
/// transferred in from elsewhere) is clamped to zero rather than
/// rejected.
pub fn shares_at_date(transactions: &[Transaction], ticker: &str, as_of: NaiveDate) -> Decimal {
    let shares: Decimal = transactions
        .iter()
        .filter(|tx| tx.ticker == ticker && tx.transacted_on() <= as_of)
        .map(|tx| match tx.side {
            TransactionSide::Buy => tx.quantity,
            TransactionSide::Sell => -tx.quantity,
        })
        .sum();

    shares.max(Decimal::ZERO)
}

/// Blended cost per share for `ticker`: Σ(quantity × unit price) over all
/// BUY entries divided by Σ quantity, or zero when no BUY exists.
///
/// SELL entries never reduce the basis; the average is recomputed from
/// the full BUY history even after partial sells. No lot tracking.
pub fn weighted_average_cost(transactions: &[Transaction], ticker: &str) -> Decimal {
    let mut total_cost = Decimal::ZERO;
    let mut total_quantity = Decimal::ZERO;

    for tx in transactions
        .iter()
        .filter(|tx| tx.ticker == ticker && tx.side == TransactionSide::Buy)
    {
        total_cost += tx.quantity * tx.unit_price;
        total_quantity += tx.quantity;
    }

    if total_quantity.is_zero() {
        return Decimal::ZERO;
    }

    total_cost / total_quantity
}
