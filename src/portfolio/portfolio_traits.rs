use super::portfolio_model::PortfolioSnapshot;
use crate::errors::Result;

/// Datastore operations backing the daily snapshot series.
pub trait SnapshotRepositoryTrait: Send + Sync {
    /// Insert-or-replace keyed by snapshot date; recomputing today's
    /// snapshot overwrites it.
    fn upsert_snapshot(&self, snapshot: &PortfolioSnapshot) -> Result<()>;

    /// Full series, oldest first, for time-series display.
    fn list_snapshots(&self) -> Result<Vec<PortfolioSnapshot>>;
}
