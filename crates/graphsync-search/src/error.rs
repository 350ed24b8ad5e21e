//! Search backend error types.

use thiserror::Error;

/// Errors from the search backend.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Transport-level failure talking to the search engine
    #[error("Search transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The search engine rejected a request
    #[error("Search backend error: {0}")]
    Backend(String),

    /// A request or response body could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
