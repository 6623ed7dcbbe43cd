//! Routine template
//!
//! A routine is persisted as a TOML manifest: the fixed primary strategy,
//! the target schema and one fallback body. The template owns everything
//! except the two substitution points, so two instantiations with the same
//! schema and fallback render byte-identical text.

use crate::error::RoutineError;
use crate::fallback::FallbackBody;
use crate::target::TargetId;
use serde::{Deserialize, Serialize};
use stmtgen_table::{ContentHash, Schema};

/// Manifest layout version
pub const MANIFEST_FORMAT: u32 = 1;

/// Characters removed from table cells by the primary strategy
pub const DEFAULT_STRIP_SYMBOLS: &str = "₹$€£¥,";

/// Minimum rows (header included) for a table candidate
pub const DEFAULT_MIN_ROWS: usize = 2;

/// Persisted routine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineManifest {
    pub routine: RoutineHeader,
    pub primary: PrimaryStrategy,
    pub fallback: FallbackBody,
}

/// Routine identity and output schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineHeader {
    pub name: String,
    pub format: u32,
    pub columns: Schema,
}

/// Table-header-match strategy parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryStrategy {
    pub min_rows: usize,
    pub strip_symbols: String,
}

impl Default for PrimaryStrategy {
    fn default() -> Self {
        Self {
            min_rows: DEFAULT_MIN_ROWS,
            strip_symbols: DEFAULT_STRIP_SYMBOLS.to_string(),
        }
    }
}

/// Rendered routine text plus its content hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineSource {
    name: String,
    text: String,
    hash: ContentHash,
}

impl RoutineSource {
    /// Wrap persisted text
    #[must_use]
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            name: name.into(),
            hash: ContentHash::compute(text.as_bytes()),
            text,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    #[must_use]
    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    /// Parse the text back into a manifest
    ///
    /// # Errors
    /// Returns `RoutineError::Manifest` if the text is not a valid manifest
    pub fn manifest(&self) -> Result<RoutineManifest, RoutineError> {
        toml::from_str(&self.text).map_err(|e| RoutineError::Manifest {
            name: self.name.clone(),
            source: e,
        })
    }
}

/// Fixed routine skeleton for one target
#[derive(Debug, Clone)]
pub struct RoutineTemplate {
    name: String,
    primary: PrimaryStrategy,
}

impl RoutineTemplate {
    /// Template for `target`'s routine
    #[must_use]
    pub fn new(target: &TargetId) -> Self {
        Self {
            name: target.routine_name(),
            primary: PrimaryStrategy::default(),
        }
    }

    /// Routine name every instantiation carries
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render a routine for `schema` with `fallback` substituted
    ///
    /// # Errors
    /// Returns `RoutineError::Render` if the manifest cannot be serialized
    pub fn instantiate(
        &self,
        schema: &Schema,
        fallback: &FallbackBody,
    ) -> Result<RoutineSource, RoutineError> {
        let manifest = RoutineManifest {
            routine: RoutineHeader {
                name: self.name.clone(),
                format: MANIFEST_FORMAT,
                columns: schema.clone(),
            },
            primary: self.primary.clone(),
            fallback: fallback.clone(),
        };
        let body = toml::to_string_pretty(&manifest).map_err(|e| RoutineError::Render {
            name: self.name.clone(),
            source: e,
        })?;
        let text = format!(
            "# Generated by stmtgen; rewritten on every synthesis attempt.\n# fallback: {}\n\n{body}",
            fallback.variant
        );
        Ok(RoutineSource::from_text(self.name.clone(), text))
    }
}
