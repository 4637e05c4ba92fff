pub(crate) mod market_data_provider;
pub(crate) mod yahoo_provider;

pub use market_data_provider::MarketDataProvider;
pub use yahoo_provider::YahooProvider;
