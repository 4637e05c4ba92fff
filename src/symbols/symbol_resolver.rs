use lazy_static::lazy_static;
use std::collections::HashMap;

/// Quote-currency suffix the market data provider uses for crypto pairs.
const CRYPTO_QUOTE_SUFFIX: &str = "-USD";

/// Exchange suffix for names listed on the Santiago stock exchange.
const SANTIAGO_SUFFIX: &str = ".SN";

lazy_static! {
    /// Internal ticker -> provider symbol. Anything absent maps to
    /// itself, which is correct for US-listed names.
    static ref SYMBOL_OVERRIDES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        // Crypto assets quoted against USD
        m.insert("BTC", "BTC-USD");
        m.insert("ETH", "ETH-USD");
        m.insert("DOGE", "DOGE-USD");
        m.insert("SOL", "SOL-USD");
        m.insert("ADA", "ADA-USD");
        m.insert("XRP", "XRP-USD");
        m.insert("AVAX", "AVAX-USD");
        m.insert("DOT", "DOT-USD");
        m.insert("MATIC", "MATIC-USD");
        m.insert("LINK", "LINK-USD");
        m.insert("EWT", "EWT-USD");
        m.insert("AVAIL", "AVAIL-USD");
        m.insert("CAKE", "CAKE-USD");
        m.insert("ATOM", "ATOM-USD");
        m.insert("UNI", "UNI-USD");
        m.insert("AAVE", "AAVE-USD");
        m.insert("LTC", "LTC-USD");
        m.insert("BNB", "BNB-USD");
        m.insert("NEAR", "NEAR-USD");
        m.insert("ALGO", "ALGO-USD");
        m.insert("XLM", "XLM-USD");
        m.insert("VET", "VET-USD");
        m.insert("FIL", "FIL-USD");
        m.insert("THETA", "THETA-USD");
        m.insert("FTM", "FTM-USD");
        m.insert("SAND", "SAND-USD");
        m.insert("MANA", "MANA-USD");
        m.insert("AXS", "AXS-USD");
        m.insert("SHIB", "SHIB-USD");
        // Santiago-listed equities
        m.insert("SQM-B", "SQM-B.SN");
        m.insert("BCI", "BCI.SN");
        m.insert("FALABELLA", "FALABELLA.SN");
        m.insert("SANTANDER", "BSANTANDER.SN");
        m.insert("CHILE", "CHILE.SN");
        m.insert("COPEC", "COPEC.SN");
        m.insert("CENCOSUD", "CENCOSUD.SN");
        m.insert("ENELAM", "ENELAM.SN");
        m.insert("CCU", "CCU.SN");
        m
    };
}

/// Maps an internal ticker to the symbol the market data provider
/// recognizes. Unknown tickers pass through unchanged.
pub fn resolve(ticker: &str) -> String {
    let trimmed = ticker.trim();
    SYMBOL_OVERRIDES
        .get(trimmed)
        .map(|s| s.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Classification by the shape of the resolved symbol, deliberately
/// independent of whatever asset class an import file claimed.
pub fn is_crypto(ticker: &str) -> bool {
    resolve(ticker).ends_with(CRYPTO_QUOTE_SUFFIX)
}

pub fn is_foreign_listed(ticker: &str) -> bool {
    resolve(ticker).ends_with(SANTIAGO_SUFFIX)
}
