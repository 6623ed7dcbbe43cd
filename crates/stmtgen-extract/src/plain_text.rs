//! Engine for documents that are already text

use crate::engine::{ExtractionEngine, Grid};
use crate::error::ExtractError;
use crate::layout::{detect_tables, split_pages};
use std::path::Path;

/// Reads a UTF-8 file; form feeds separate pages
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextEngine;

impl PlainTextEngine {
    fn read(path: &Path) -> Result<String, ExtractError> {
        let bytes = std::fs::read(path).map_err(|e| ExtractError::io_error(path, e))?;
        String::from_utf8(bytes).map_err(|_| ExtractError::Encoding(path.to_path_buf()))
    }
}

impl ExtractionEngine for PlainTextEngine {
    fn page_tables(&self, path: &Path) -> Result<Vec<Vec<Grid>>, ExtractError> {
        let text = Self::read(path)?;
        Ok(split_pages(&text).iter().map(|p| detect_tables(p)).collect())
    }

    fn page_text(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        Ok(split_pages(&Self::read(path)?))
    }

    fn name(&self) -> &'static str {
        "plain-text"
    }
}
