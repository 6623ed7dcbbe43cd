//! Error types for schemas and tables

use std::path::PathBuf;

/// Errors from schema construction and CSV I/O
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Schema with no columns
    #[error("schema must contain at least one column")]
    EmptySchema,

    /// Column name appears twice
    #[error("duplicate column: '{0}'")]
    DuplicateColumn(String),

    /// CSV file has no header row
    #[error("no header row in {0}")]
    MissingHeader(PathBuf),

    /// CSV read failure for a file
    #[error("csv error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// CSV encoding failure
    #[error("csv write error: {0}")]
    CsvWrite(#[from] csv::Error),

    /// IO error while writing
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Output was not valid UTF-8
    #[error("invalid utf-8 in csv output")]
    Encoding,
}

impl TableError {
    /// Create CSV error for path
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}
