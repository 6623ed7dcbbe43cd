//! Extraction engine capability
//!
//! The one seam generated routines use to look inside a document. An engine
//! offers two views of the same file:
//! - structured table candidates per page (rows of optional cells)
//! - raw text per page

use crate::error::ExtractError;
use crate::pdftotext::PdftotextEngine;
use crate::plain_text::PlainTextEngine;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One table candidate: rows of cells, `None` where the engine saw no cell
pub type Grid = Vec<Vec<Option<String>>>;

/// Document extraction capability consumed by routines
pub trait ExtractionEngine: Send + Sync + Debug {
    /// Table candidates, grouped by page in document order
    ///
    /// # Errors
    /// Returns error if the document cannot be opened or decoded
    fn page_tables(&self, path: &Path) -> Result<Vec<Vec<Grid>>, ExtractError>;

    /// Raw text per page in document order
    ///
    /// # Errors
    /// Returns error if the document cannot be opened or decoded
    fn page_text(&self, path: &Path) -> Result<Vec<String>, ExtractError>;

    /// Short engine name for logs
    fn name(&self) -> &'static str;
}

/// Engine selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    /// Dispatch on file extension
    #[default]
    Auto,
    /// Always shell out to `pdftotext`
    Pdftotext,
    /// Always read the file as UTF-8 text
    PlainText,
}

impl EngineKind {
    /// Name accepted by [`std::str::FromStr`]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Pdftotext => "pdftotext",
            Self::PlainText => "plain-text",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "pdftotext" => Ok(Self::Pdftotext),
            "plain-text" | "text" => Ok(Self::PlainText),
            other => Err(format!("unknown engine: {other}")),
        }
    }
}

/// Build the engine for `kind`
#[must_use]
pub fn build_engine(kind: EngineKind, pdftotext_bin: impl Into<PathBuf>) -> Arc<dyn ExtractionEngine> {
    match kind {
        EngineKind::Auto => Arc::new(AutoEngine::new(pdftotext_bin)),
        EngineKind::Pdftotext => Arc::new(PdftotextEngine::new(pdftotext_bin)),
        EngineKind::PlainText => Arc::new(PlainTextEngine),
    }
}

/// Routes `.pdf` files to `pdftotext` and everything else to plain text
#[derive(Debug, Clone)]
pub struct AutoEngine {
    pdf: PdftotextEngine,
    text: PlainTextEngine,
}

impl AutoEngine {
    /// Create with the given `pdftotext` binary
    #[inline]
    #[must_use]
    pub fn new(pdftotext_bin: impl Into<PathBuf>) -> Self {
        Self {
            pdf: PdftotextEngine::new(pdftotext_bin),
            text: PlainTextEngine,
        }
    }

    fn pick(&self, path: &Path) -> &dyn ExtractionEngine {
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            &self.pdf
        } else {
            &self.text
        }
    }
}

impl ExtractionEngine for AutoEngine {
    fn page_tables(&self, path: &Path) -> Result<Vec<Vec<Grid>>, ExtractError> {
        self.pick(path).page_tables(path)
    }

    fn page_text(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        self.pick(path).page_text(path)
    }

    fn name(&self) -> &'static str {
        "auto"
    }
}
