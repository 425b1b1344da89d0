//! Error types for the Facet library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Facet operations.
#[derive(Debug, Error)]
pub enum FacetError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to analyze.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Columns of a dataset disagree on row count.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A named column does not exist in the dataset.
    #[error("Unknown column: '{0}'")]
    UnknownColumn(String),

    /// Chart rendering failed.
    #[error("Render error: {0}")]
    Render(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Facet operations.
pub type Result<T> = std::result::Result<T, FacetError>;
