//! # graphsync-types
//!
//! Shared domain types for the graphsync loader.
//!
//! This crate defines the structures used throughout the pipeline:
//! - Records: loosely typed rows pulled from the graph source
//! - Index specification: the declarative per-index sync contract
//! - Settings: layered runtime configuration
//! - Run statistics: the per-run accumulator and its report artifacts

pub mod error;
pub mod record;
pub mod settings;
pub mod spec;
pub mod stats;

pub use error::ConfigError;
pub use record::{record_id, Page, Record};
pub use settings::{GraphSettings, SearchSettings, Settings};
pub use spec::{
    load_index_spec, AboutIndex, IndexDefinition, IndexSpec, ModelIndex, QueryDefinition,
    QueryIndex, UpdateQueryDefinition, WriteMode,
};
pub use stats::{IndexOutcome, IndexStat, RunStats};
