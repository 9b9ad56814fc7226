// src/error.rs

use std::path::PathBuf;

use thiserror::Error;

/// Result type for the extraction and reconciliation core.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything the core can fail with.
///
/// `NotFound`, `Schema` and `InvalidNumber` abort a build when they come from a
/// primary table. `SecondarySourceUnavailable` is only ever logged.
#[derive(Debug, Error)]
pub enum Error {
    /// A required per-year document could not be located.
    #[error("not found: {0}")]
    NotFound(String),

    /// A document lacks the column or row shape a rule expects.
    #[error("schema error in {document}: {message}")]
    Schema { document: String, message: String },

    /// Secondary benchmark data could not be used.
    #[error("secondary source unavailable: {0}")]
    SecondarySourceUnavailable(String),

    /// Cleaned cell text was not a number.
    #[error("invalid number {raw:?}")]
    InvalidNumber { raw: String },

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),
}

impl Error {
    pub fn schema(document: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Schema {
            document: document.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
