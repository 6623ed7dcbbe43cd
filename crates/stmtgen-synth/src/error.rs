//! Error types for stmtgen synthesis
//!
//! Provides error handling for:
//! - Setup failures (invalid target, missing sample assets, configuration)
//! - Routine rendering and loading
//! - Oracle loading
//! - Validation runner failures
//! - Retry budget exhaustion
//!
//! A failing oracle verdict is not an error: it is recorded on the attempt
//! and only becomes [`SynthError::SynthesisExhausted`] once every attempt
//! has failed.

use crate::fallback::FallbackStrategy;
use crate::types::AssetKind;
use std::path::PathBuf;
use stmtgen_table::TableError;

/// Main synthesis error type
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// Target identifier is empty or has characters outside `[a-z0-9_-]`
    #[error("invalid target identifier: '{0}'")]
    InvalidTarget(String),

    /// Sample document or reference table not found
    #[error("no {missing} found for '{target}' in {}", dir.display())]
    AssetNotFound {
        target: String,
        dir: PathBuf,
        missing: AssetKind,
    },

    /// Every attempt produced a failing verdict
    #[error("parser generation failed for '{target}' after {attempts} attempts")]
    SynthesisExhausted {
        target: String,
        attempts: u32,
        last_diagnostic: String,
    },

    /// Reference table could not be read
    #[error("table error: {0}")]
    Table(#[from] TableError),

    /// Routine could not be rendered or loaded
    #[error("routine error: {0}")]
    Routine(#[from] RoutineError),

    /// Oracle could not be rendered or loaded
    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Validation runner could not execute the oracle
    #[error("runner error: {0}")]
    Runner(#[from] RunnerError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Workspace IO failure
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A routine panicked while parsing a document
    #[error("routine panicked: {0}")]
    RoutinePanicked(String),
}

impl SynthError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if error is retryable
    ///
    /// Only runner failures are worth running again; setup errors and
    /// exhaustion are final for the run.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Runner(_))
    }

    /// Check if error happened before any attempt was made
    #[inline]
    #[must_use]
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidTarget(_) | Self::AssetNotFound { .. } | Self::Config(_) | Self::Table(_)
        )
    }
}

/// Routine rendering and loading errors
#[derive(Debug, thiserror::Error)]
pub enum RoutineError {
    /// Manifest could not be rendered
    #[error("failed to render routine {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: toml::ser::Error,
    },

    /// Persisted routine text is not a valid manifest
    #[error("invalid routine manifest {name}: {source}")]
    Manifest {
        name: String,
        #[source]
        source: toml::de::Error,
    },

    /// Fallback pattern does not compile
    #[error("fallback pattern for {variant} does not compile: {source}")]
    Pattern {
        variant: FallbackStrategy,
        #[source]
        source: regex::Error,
    },

    /// Fallback pattern lacks a required capture group
    #[error("fallback pattern for {variant} lacks capture group '{group}'")]
    MissingGroup {
        variant: FallbackStrategy,
        group: &'static str,
    },

    /// No routine persisted at the conventional location
    #[error("no routine persisted at {}", .0.display())]
    NotFound(PathBuf),

    /// Persisted routine could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Oracle rendering and loading errors
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// Oracle could not be rendered
    #[error("failed to render oracle: {0}")]
    Render(#[from] toml::ser::Error),

    /// Oracle file is not valid
    #[error("invalid oracle {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Oracle file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Validation runner errors
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Validation process could not be started
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Current executable could not be located
    #[error("cannot locate current executable: {0}")]
    CurrentExe(#[source] std::io::Error),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::SynthConfig`]
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Environment override has an unusable value
    #[error("invalid value for {key}: '{value}'")]
    InvalidOverride { key: String, value: String },

    /// Configuration is internally inconsistent
    #[error("{0}")]
    Invalid(String),
}
