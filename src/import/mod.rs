pub(crate) mod delta_parser;
pub(crate) mod import_errors;
pub(crate) mod import_model;
pub(crate) mod import_service;

// Re-export the public interface
pub use delta_parser::{parse_delta_export, parse_delta_file};
pub use import_errors::ImportError;
pub use import_model::{ImportOutcome, ImportSummary, ParsedImport};
pub use import_service::ImportService;
