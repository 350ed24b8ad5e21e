//! Layered runtime configuration.
//!
//! Precedence, lowest to highest: built-in defaults, config file
//! (`graphsync.yaml` or a path given on the command line), environment
//! variables (`GRAPHSYNC_*`, `__` separating nesting levels), CLI flags.
//! CLI flags are applied by the caller after `Settings::load` returns.
//! The result is deserialized once into this immutable struct; the
//! pipeline never reads raw configuration maps.

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::ConfigError;

/// Graph database connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphSettings {
    /// Base URL of the graph database HTTP endpoint.
    #[serde(default = "default_graph_url")]
    pub url: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            url: default_graph_url(),
            username: None,
            password: None,
        }
    }
}

/// Search engine connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    /// Base URL of the search engine REST endpoint.
    #[serde(default = "default_search_url")]
    pub url: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Verify TLS certificates when connecting over https.
    #[serde(default)]
    pub verify_certs: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            url: default_search_url(),
            username: None,
            password: None,
            verify_certs: false,
        }
    }
}

fn default_graph_url() -> String {
    "http://localhost:7474".to_string()
}

fn default_search_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_true() -> bool {
    true
}

fn default_report_dir() -> String {
    "./reports".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main loader settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub graph: GraphSettings,

    #[serde(default)]
    pub search: SearchSettings,

    /// Path to the index specification YAML file.
    #[serde(default)]
    pub index_spec_file: Option<String>,

    /// Delete each destination index before processing it.
    #[serde(default)]
    pub clear_existing_indices: bool,

    /// Create missing destination indices (with the declared mapping).
    #[serde(default = "default_true")]
    pub allow_index_creation: bool,

    /// Allow-list restricting which declared indices are processed.
    #[serde(default)]
    pub selected_indices: Option<Vec<String>>,

    /// Path to the about file for `about_file` indices.
    #[serde(default)]
    pub about_file: Option<String>,

    /// Paths to graph-schema model YAML files for `model` indices.
    #[serde(default)]
    pub model_files: Option<Vec<String>>,

    /// Process only one page per query, to smoke-test every query.
    #[serde(default)]
    pub test_mode: bool,

    /// Keep the id field inside the document body in addition to using it
    /// as the document identifier.
    #[serde(default = "default_true")]
    pub keep_id_in_source: bool,

    /// Directory for the timestamped run-report artifacts.
    #[serde(default = "default_report_dir")]
    pub report_dir: String,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            graph: GraphSettings::default(),
            search: SearchSettings::default(),
            index_spec_file: None,
            clear_existing_indices: false,
            allow_index_creation: true,
            selected_indices: None,
            about_file: None,
            model_files: None,
            test_mode: false,
            keep_id_in_source: true,
            report_dir: default_report_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (`graphsync.yaml` in the working directory, optional)
    /// 3. CLI-specified config file (optional, required if given)
    /// 4. Environment variables (`GRAPHSYNC_*`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name("graphsync").required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: GRAPHSYNC_INDEX_SPEC_FILE, GRAPHSYNC_GRAPH__URL,
        // GRAPHSYNC_SEARCH__USERNAME, GRAPHSYNC_SELECTED_INDICES=a,b
        builder = builder.add_source(
            Environment::with_prefix("GRAPHSYNC")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("selected_indices")
                .with_list_parse_key("model_files"),
        );

        let config = builder
            .build()
            .map_err(|e| ConfigError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| ConfigError::Config(e.to_string()))?;

        Ok(settings)
    }

    /// Effective selection filter: names trimmed, empties dropped.
    ///
    /// `None` means every declared index is processed. An explicitly empty
    /// or all-blank list also collapses to `None`.
    pub fn effective_selection(&self) -> Option<Vec<String>> {
        let selected = self.selected_indices.as_ref()?;
        let trimmed: Vec<String> = selected
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}
