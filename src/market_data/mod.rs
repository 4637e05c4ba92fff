pub(crate) mod market_data_errors;
pub(crate) mod market_data_model;
pub(crate) mod market_data_repository;
pub(crate) mod market_data_service;
pub(crate) mod market_data_traits;
pub(crate) mod providers;

// Re-export the public interface
pub use market_data_errors::MarketDataError;
pub use market_data_model::{
    fx_pair, DividendEvent, DividendRecord, DividendUpdateReport, FxRate, FxUpdateReport,
    PriceObservation, PriceUpdateReport,
};
pub use market_data_repository::MarketDataRepository;
pub use market_data_service::MarketDataService;
pub use market_data_traits::{MarketDataRepositoryTrait, Sleeper, TokioSleeper};
pub use providers::{MarketDataProvider, YahooProvider};
