//! CLI argument parsing for the graphsync loader.
//!
//! Every flag overrides its configuration-file and environment
//! counterpart; unset flags leave the loaded settings untouched. Boolean
//! settings get a flag pair so either value can be forced from the
//! command line.

use clap::Parser;

use graphsync_types::Settings;

/// Graph-to-search synchronization loader
///
/// Reads an index specification, pulls paged query results from the
/// graph database, and loads them into the search engine.
#[derive(Parser, Debug)]
#[command(name = "graphsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides graphsync.yaml in the working directory)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Path to the index specification YAML file
    #[arg(short, long)]
    pub index_spec_file: Option<String>,

    /// Graph database HTTP endpoint
    #[arg(long)]
    pub graph_url: Option<String>,

    /// Graph database username
    #[arg(long)]
    pub graph_user: Option<String>,

    /// Graph database password
    #[arg(long)]
    pub graph_password: Option<String>,

    /// Search engine REST endpoint
    #[arg(long)]
    pub search_url: Option<String>,

    /// Search engine username
    #[arg(long)]
    pub search_user: Option<String>,

    /// Search engine password
    #[arg(long)]
    pub search_password: Option<String>,

    /// Verify TLS certificates when connecting to the search engine
    #[arg(long, conflicts_with = "no_verify_certs")]
    pub verify_certs: bool,

    /// Do not verify TLS certificates
    #[arg(long)]
    pub no_verify_certs: bool,

    /// Delete each destination index before processing it
    #[arg(long, conflicts_with = "no_clear_existing_indices")]
    pub clear_existing_indices: bool,

    /// Keep existing destination indices
    #[arg(long)]
    pub no_clear_existing_indices: bool,

    /// Create missing destination indices
    #[arg(long, conflicts_with = "no_allow_index_creation")]
    pub allow_index_creation: bool,

    /// Do not create missing destination indices
    #[arg(long)]
    pub no_allow_index_creation: bool,

    /// Process only the named indices (comma-separated, repeatable)
    #[arg(long, value_delimiter = ',')]
    pub selected_indices: Vec<String>,

    /// Path to the about file for about_file indices
    #[arg(long)]
    pub about_file: Option<String>,

    /// Graph-schema model YAML files for model indices (comma-separated,
    /// repeatable)
    #[arg(long, value_delimiter = ',')]
    pub model_files: Vec<String>,

    /// Process only one page per query, to smoke-test every query
    #[arg(long)]
    pub test_mode: bool,

    /// Drop the id field from document bodies
    #[arg(long)]
    pub strip_id: bool,

    /// Directory for the run-report artifacts
    #[arg(long)]
    pub report_dir: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Apply the flags over loaded settings, highest precedence.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(path) = &self.index_spec_file {
            settings.index_spec_file = Some(path.clone());
        }
        if let Some(url) = &self.graph_url {
            settings.graph.url = url.clone();
        }
        if let Some(user) = &self.graph_user {
            settings.graph.username = Some(user.clone());
        }
        if let Some(password) = &self.graph_password {
            settings.graph.password = Some(password.clone());
        }
        if let Some(url) = &self.search_url {
            settings.search.url = url.clone();
        }
        if let Some(user) = &self.search_user {
            settings.search.username = Some(user.clone());
        }
        if let Some(password) = &self.search_password {
            settings.search.password = Some(password.clone());
        }
        if let Some(verify) = pair(self.verify_certs, self.no_verify_certs) {
            settings.search.verify_certs = verify;
        }
        if let Some(clear) = pair(self.clear_existing_indices, self.no_clear_existing_indices) {
            settings.clear_existing_indices = clear;
        }
        if let Some(create) = pair(self.allow_index_creation, self.no_allow_index_creation) {
            settings.allow_index_creation = create;
        }
        if !self.selected_indices.is_empty() {
            settings.selected_indices = Some(self.selected_indices.clone());
        }
        if let Some(path) = &self.about_file {
            settings.about_file = Some(path.clone());
        }
        if !self.model_files.is_empty() {
            settings.model_files = Some(self.model_files.clone());
        }
        if self.test_mode {
            settings.test_mode = true;
        }
        if self.strip_id {
            settings.keep_id_in_source = false;
        }
        if let Some(dir) = &self.report_dir {
            settings.report_dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }
    }
}

/// Resolve a positive/negative flag pair into an override, or `None` when
/// neither was given.
fn pair(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}
