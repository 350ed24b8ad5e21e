//! Pipeline error taxonomy.
//!
//! All of these abort the owning index only; the runner records an
//! `ERROR` statistic and moves on to the next index.

use thiserror::Error;

use graphsync_graph::GraphError;
use graphsync_mapping::MappingError;
use graphsync_model::ModelError;
use graphsync_search::SearchError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The index declares a malformed mapping
    #[error("Invalid mapping for index '{index}': {source}")]
    InvalidMapping {
        index: String,
        #[source]
        source: MappingError,
    },

    /// The first page of a query carries fields absent from the mapping
    #[error("Unmapped fields in index '{index}', query '{query}': {fields:?}")]
    UnmappedFields {
        index: String,
        query: String,
        fields: Vec<String>,
    },

    /// A required index configuration key is absent
    #[error("Index '{index}' is missing required configuration '{field}'")]
    MissingRequiredConfig { index: String, field: &'static str },

    /// A bulk write failed and its single retry failed too
    #[error("Bulk write failed after retry: {0}")]
    WriteFailure(SearchError),

    /// The about file is missing or malformed
    #[error("About file error: {0}")]
    AboutFile(String),

    /// Query validation or execution failure
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Search backend failure outside the retried bulk path
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Graph-schema model failure
    #[error(transparent)]
    Model(#[from] ModelError),
}
