//! Error types for a single tchat invocation.
//!
//! Every variant is terminal: `main` prints it to stderr and exits with
//! status 1.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias used across the query pipeline.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Command line could not be parsed. Holds clap's rendered message.
    #[error("{0}")]
    Usage(String),

    #[error("Open command cannot be empty.")]
    EmptyOpenCommand,

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read stdin: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("No query provided.")]
    EmptyQuery,

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Failed to open URL: {0}")]
    Launch(String),

    #[error("Failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

impl Error {
    /// Whether the help text should follow the message.
    pub fn wants_usage(&self) -> bool {
        matches!(self, Error::EmptyQuery)
    }
}
