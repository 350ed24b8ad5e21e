//! The search backend interface the pipeline writes through.

use async_trait::async_trait;
use serde_json::Value;

use graphsync_types::Record;

use crate::error::SearchError;

/// Bulk operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOp {
    /// Create or fully replace the document.
    Index,
    /// Partially update an existing document; fails with 404 when absent.
    Update,
}

/// One document operation inside a bulk request.
#[derive(Debug, Clone)]
pub struct BulkAction {
    pub op: BulkOp,
    pub id: String,
    pub body: Record,
}

impl BulkAction {
    pub fn index(id: impl Into<String>, body: Record) -> Self {
        Self {
            op: BulkOp::Index,
            id: id.into(),
            body,
        }
    }

    pub fn update(id: impl Into<String>, body: Record) -> Self {
        Self {
            op: BulkOp::Update,
            id: id.into(),
            body,
        }
    }
}

/// A per-document failure reported inside an otherwise accepted bulk
/// response.
#[derive(Debug, Clone)]
pub struct FailedItem {
    pub id: String,
    pub status: u16,
    pub reason: String,
}

impl FailedItem {
    /// An update against a document that does not exist.
    pub fn is_missing(&self) -> bool {
        self.status == 404
    }
}

/// Outcome of one bulk request.
#[derive(Debug, Clone, Default)]
pub struct BulkOutcome {
    pub succeeded: usize,
    pub failed: Vec<FailedItem>,
}

/// Index management and document write operations of the search engine.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Whether the index exists.
    async fn exists(&self, index: &str) -> Result<bool, SearchError>;

    /// Delete the index. Deleting a missing index is not an error.
    async fn delete_index(&self, index: &str) -> Result<(), SearchError>;

    /// Create the index, optionally with a mapping body.
    async fn create_index(&self, index: &str, mapping: Option<&Value>) -> Result<(), SearchError>;

    /// Fetch one document's source by id.
    async fn get(&self, index: &str, id: &str) -> Result<Option<Record>, SearchError>;

    /// Create or fully replace one document.
    async fn index_document(&self, index: &str, id: &str, doc: &Record) -> Result<(), SearchError>;

    /// Execute a bulk request. A whole-batch rejection is an `Err`;
    /// per-document failures come back inside the outcome.
    async fn bulk(
        &self,
        index: &str,
        actions: &[BulkAction],
        refresh: bool,
    ) -> Result<BulkOutcome, SearchError>;

    /// Make previous writes visible to search.
    async fn refresh(&self, index: &str) -> Result<(), SearchError>;
}
