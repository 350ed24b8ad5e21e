//! # graphsync-cli
//!
//! The `graphsync` binary: argument parsing, configuration layering, and
//! the loader run command.

pub mod cli;
pub mod commands;

pub use cli::Cli;
pub use commands::run;
