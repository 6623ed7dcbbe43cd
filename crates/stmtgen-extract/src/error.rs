//! Extraction engine errors
//!
//! Routines never surface these; they are logged and treated as "no data".

use std::path::PathBuf;

/// Errors raised by an extraction engine
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Document could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// External tool could not be started
    #[error("failed to spawn {binary}: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// External tool exited unsuccessfully
    #[error("{binary} exited with {code:?}: {stderr}")]
    Tool {
        binary: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    /// Extracted text was not valid UTF-8
    #[error("extracted text of {0} is not valid utf-8")]
    Encoding(PathBuf),
}

impl ExtractError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
