//! Index specification data model.
//!
//! An index specification is a YAML document listing index definitions.
//! It is read once per run and immutable afterwards. Index definitions are
//! a closed sum type: query-driven indices, static about-file indices, and
//! model indices derived from the graph-schema model each get their own
//! variant, so the runner dispatches on the variant rather than on a type
//! string.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Write semantics for an update query's pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Read existing document, overlay new fields, write back.
    #[default]
    Merge,
    /// Modify existing documents only; missing documents are skipped.
    Update,
}

/// One paginated query against the graph source.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryDefinition {
    /// Display name used in logs and the query-time report.
    #[serde(default = "default_query_name")]
    pub name: String,

    /// Query text. Must reference `$skip` and `$limit` and be read-only.
    pub query: String,

    /// Caller-supplied parameters; the pagination pair always wins on merge.
    #[serde(default)]
    pub variables: Map<String, Value>,

    /// Records per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_query_name() -> String {
    "unnamed".to_string()
}

fn default_page_size() -> usize {
    10_000
}

/// An update query, executed after the initial query completes.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateQueryDefinition {
    #[serde(flatten)]
    pub query: QueryDefinition,

    /// How this query's pages are written (merge by default).
    #[serde(default)]
    pub mode: WriteMode,
}

/// A query-driven index definition.
///
/// `id_field`, `mapping`, and `initial_query` are required for processing
/// but optional here: a missing one aborts that index at run time, not the
/// whole specification load.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryIndex {
    pub index_name: String,
    pub id_field: Option<String>,
    /// Raw grouped field declaration (`type -> [field, ...]`), parsed into
    /// a normalized mapping per index.
    pub mapping: Option<serde_yaml::Value>,
    pub initial_query: Option<QueryDefinition>,
    #[serde(default)]
    pub update_queries: Vec<UpdateQueryDefinition>,
}

/// A static index populated from the about file.
#[derive(Debug, Clone, Deserialize)]
pub struct AboutIndex {
    pub index_name: String,
}

/// An index of documents derived from the graph-schema model.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelIndex {
    pub index_name: String,
}

/// One declared index. The `type` key selects the variant; absent means
/// `query`, matching the original specification files.
#[derive(Debug, Clone)]
pub enum IndexDefinition {
    Query(QueryIndex),
    AboutFile(AboutIndex),
    Model(ModelIndex),
}

impl IndexDefinition {
    /// Name of the destination index.
    pub fn index_name(&self) -> &str {
        match self {
            IndexDefinition::Query(q) => &q.index_name,
            IndexDefinition::AboutFile(a) => &a.index_name,
            IndexDefinition::Model(m) => &m.index_name,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum IndexKind {
    #[default]
    Query,
    AboutFile,
    Model,
}

impl<'de> Deserialize<'de> for IndexDefinition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawIndex {
            index_name: String,
            #[serde(rename = "type", default)]
            kind: IndexKind,
            id_field: Option<String>,
            mapping: Option<serde_yaml::Value>,
            initial_query: Option<QueryDefinition>,
            #[serde(default)]
            update_queries: Vec<UpdateQueryDefinition>,
        }

        let raw = RawIndex::deserialize(deserializer)?;
        Ok(match raw.kind {
            IndexKind::Query => IndexDefinition::Query(QueryIndex {
                index_name: raw.index_name,
                id_field: raw.id_field,
                mapping: raw.mapping,
                initial_query: raw.initial_query,
                update_queries: raw.update_queries,
            }),
            IndexKind::AboutFile => IndexDefinition::AboutFile(AboutIndex {
                index_name: raw.index_name,
            }),
            IndexKind::Model => IndexDefinition::Model(ModelIndex {
                index_name: raw.index_name,
            }),
        })
    }
}

/// The full index specification: a list of index definitions.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexSpec {
    #[serde(default)]
    pub indices: Vec<IndexDefinition>,
}

/// Load an index specification from a YAML file.
///
/// A missing file or an empty indices list is fatal to the run.
pub fn load_index_spec(path: &str) -> Result<IndexSpec, ConfigError> {
    if !Path::new(path).is_file() {
        return Err(ConfigError::SpecNotFound(path.to_string()));
    }
    let text = std::fs::read_to_string(path)?;
    let spec: IndexSpec = serde_yaml::from_str(&text)?;
    if spec.indices.is_empty() {
        return Err(ConfigError::EmptySpec(path.to_string()));
    }
    Ok(spec)
}
