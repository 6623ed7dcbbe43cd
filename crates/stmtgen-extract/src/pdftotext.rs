//! `pdftotext` (poppler-utils) backed engine
//!
//! Tables come from `-layout` output run through [`detect_tables`]; raw text
//! uses reading-order output. Pages are split on form feed.

use crate::engine::{ExtractionEngine, Grid};
use crate::error::ExtractError;
use crate::layout::{detect_tables, split_pages};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Engine that shells out to `pdftotext`
#[derive(Debug, Clone)]
pub struct PdftotextEngine {
    binary: PathBuf,
}

impl PdftotextEngine {
    /// Create engine using `binary` (a name on `PATH` or an absolute path)
    #[inline]
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run(&self, path: &Path, layout: bool) -> Result<String, ExtractError> {
        tracing::debug!(binary = %self.binary.display(), path = %path.display(), layout, "running pdftotext");
        let mut cmd = Command::new(&self.binary);
        if layout {
            cmd.arg("-layout");
        }
        cmd.args(["-enc", "UTF-8"]).arg(path).arg("-");
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = cmd.output().map_err(|e| ExtractError::Spawn {
            binary: self.binary.clone(),
            source: e,
        })?;

        if !output.status.success() {
            return Err(ExtractError::Tool {
                binary: self.binary.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| ExtractError::Encoding(path.to_path_buf()))
    }
}

impl Default for PdftotextEngine {
    fn default() -> Self {
        Self::new("pdftotext")
    }
}

impl ExtractionEngine for PdftotextEngine {
    fn page_tables(&self, path: &Path) -> Result<Vec<Vec<Grid>>, ExtractError> {
        let text = self.run(path, true)?;
        Ok(split_pages(&text).iter().map(|p| detect_tables(p)).collect())
    }

    fn page_text(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        let text = self.run(path, false)?;
        Ok(split_pages(&text))
    }

    fn name(&self) -> &'static str {
        "pdftotext"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_spawn_error() {
        let engine = PdftotextEngine::new("/nonexistent/bin/pdftotext");
        let result = engine.page_text(Path::new("statement.pdf"));
        assert!(matches!(result, Err(ExtractError::Spawn { .. })));
    }
}
