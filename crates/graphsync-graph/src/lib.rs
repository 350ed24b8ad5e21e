//! # graphsync-graph
//!
//! The graph-source side of the pipeline: the [`GraphSource`] trait, the
//! read-only query guard, the HTTP wire client, and the offset/limit
//! pagination cursor.
//!
//! Every query is validated before any network call: it must be read-only
//! and must reference both `$skip` and `$limit`.

pub mod client;
pub mod error;
pub mod guard;
pub mod paginate;

pub use client::{HttpGraphClient, HttpGraphConfig};
pub use error::GraphError;
pub use guard::{check_pagination_params, check_read_only};
pub use paginate::Paginator;

use async_trait::async_trait;
use serde_json::{Map, Value};

use graphsync_types::Record;

/// A source of paged query results over a property graph.
#[async_trait]
pub trait GraphSource: Send + Sync {
    /// Execute a read-only query and return its records.
    async fn execute(
        &self,
        query: &str,
        params: &Map<String, Value>,
    ) -> Result<Vec<Record>, GraphError>;
}
