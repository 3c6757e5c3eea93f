use thiserror::Error;

/// Errors that can occur when building a filter from serialized terms
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid narrow terms: {0}")]
    InvalidTerms(#[from] serde_json::Error),
}
