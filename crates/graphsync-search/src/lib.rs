//! # graphsync-search
//!
//! The search-engine side of the pipeline: the [`SearchBackend`] trait,
//! bulk operation types, the REST wire client, and an in-memory backend
//! used by tests across the workspace.

pub mod backend;
pub mod client;
pub mod error;
pub mod memory;

pub use backend::{BulkAction, BulkOp, BulkOutcome, FailedItem, SearchBackend};
pub use client::{HttpSearchClient, HttpSearchConfig};
pub use error::SearchError;
pub use memory::InMemoryBackend;
