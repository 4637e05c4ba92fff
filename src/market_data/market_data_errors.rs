use thiserror::Error;

use yahoo_finance_api::YahooError;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<YahooError> for MarketDataError {
    fn from(error: YahooError) -> Self {
        match error {
            YahooError::FetchFailed(e) => MarketDataError::ProviderError(e),
            YahooError::NoQuotes => MarketDataError::NotFound("No quotes found".to_string()),
            YahooError::NoResult => MarketDataError::NotFound("No data found".to_string()),
            _ => MarketDataError::Unknown(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The retry loop treats NotFound as definitive and everything else
    // as transient, so the classification of provider errors matters.
    #[test]
    fn test_missing_data_maps_to_not_found() {
        assert!(matches!(
            MarketDataError::from(YahooError::NoQuotes),
            MarketDataError::NotFound(_)
        ));
        assert!(matches!(
            MarketDataError::from(YahooError::NoResult),
            MarketDataError::NotFound(_)
        ));
    }

    #[test]
    fn test_fetch_failure_maps_to_provider_error() {
        let error = MarketDataError::from(YahooError::FetchFailed("timeout".to_string()));
        assert!(matches!(error, MarketDataError::ProviderError(_)));
    }
}
