pub(crate) mod portfolio_model;
pub(crate) mod portfolio_repository;
pub(crate) mod portfolio_service;
pub(crate) mod portfolio_traits;

// Re-export the public interface
pub use portfolio_model::{Holding, PortfolioSnapshot, PortfolioSummary};
pub use portfolio_repository::SnapshotRepository;
pub use portfolio_service::PortfolioService;
pub use portfolio_traits::SnapshotRepositoryTrait;
