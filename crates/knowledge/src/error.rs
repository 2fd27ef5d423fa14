//! Error types for the knowledge base.

use thiserror::Error;

/// Errors that can occur while loading or querying the knowledge base.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// Filesystem failure while loading documents.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding endpoint request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The embedder produced unusable output.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The index was closed and can no longer be queried.
    #[error("Knowledge base is closed")]
    Closed,

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}
