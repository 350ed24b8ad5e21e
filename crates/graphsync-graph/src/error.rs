//! Graph-source error types.

use thiserror::Error;

/// Errors from query validation, execution, or pagination.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The query contains a mutating keyword
    #[error("Unsafe query: contains write operation '{0}'; only read-only queries are allowed")]
    UnsafeQuery(String),

    /// The query has no read clause at all
    #[error("Unsafe query: must contain a MATCH or RETURN clause")]
    MissingReadClause,

    /// The query does not reference a required pagination parameter
    #[error("Query must reference the {0} parameter")]
    MissingPaginationParameter(&'static str),

    /// Transport-level failure talking to the graph database
    #[error("Graph transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The graph database reported an execution error
    #[error("Graph backend error: {0}")]
    Backend(String),
}
