pub mod config;
pub mod constants;
pub mod db;
pub mod errors;
pub mod import;
pub mod market_data;
pub mod portfolio;
pub mod positions;
pub mod schema;
pub mod symbols;
pub mod transactions;
