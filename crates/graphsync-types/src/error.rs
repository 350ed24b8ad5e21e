//! Configuration and specification loading errors.

use thiserror::Error;

/// Errors raised while loading settings or the index specification.
///
/// These are the only errors that abort a whole run; everything that goes
/// wrong inside one index is caught at the index boundary by the runner.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Layered configuration could not be assembled or deserialized
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error reading a configuration or specification file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed YAML in a configuration or specification file
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The index specification declares no indices
    #[error("Index specification '{0}' declares no indices")]
    EmptySpec(String),

    /// The index specification file was not found
    #[error("Index specification file not found: {0}")]
    SpecNotFound(String),
}
