use thiserror::Error;

/// Structural import failures. Row-level problems never show up here;
/// they are accumulated next to the parsed rows instead.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to read import file '{path}': {reason}")]
    FileRead { path: String, reason: String },

    #[error("Unreadable import data: {0}")]
    Malformed(String),
}
