//! # graphsync-pipeline
//!
//! The synchronization pipeline: pulls paged result sets from the graph
//! source, validates their shape against the declared mapping, and writes
//! them into the search index with retry, merge, and refresh semantics.
//!
//! Indices, queries within an index, and pages within a query are all
//! processed strictly in order, one at a time. Every error raised while
//! processing one index is caught at the index boundary; the run
//! continues with the next index.

pub mod about;
pub mod error;
pub mod model_docs;
pub mod runner;
pub mod writer;

pub use error::PipelineError;
pub use runner::Runner;
pub use writer::{WriteOutcome, Writer};
