//! Workspace layout and persistence
//!
//! ```text
//! <root>/
//!   data/<target>/            sample document + reference table
//!   custom_parsers/<target>_parser.toml
//!   oracles/test_<target>.toml
//! ```

use crate::config::SynthConfig;
use crate::error::SynthError;
use crate::target::TargetId;
use crate::types::{AssetKind, Assets};
use std::path::{Path, PathBuf};
use stmtgen_table::ContentHash;

/// File extension of persisted routines and oracles
pub const ARTIFACT_EXTENSION: &str = "toml";

/// Resolved workspace directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
    data_dir: PathBuf,
    routines_dir: PathBuf,
    oracles_dir: PathBuf,
    document_extensions: Vec<String>,
    reference_extension: String,
}

impl Workspace {
    /// Resolve the layout described by `config`
    ///
    /// A relative root is anchored at the current directory so persisted
    /// oracles stay valid when executed from elsewhere.
    ///
    /// # Errors
    /// Returns `SynthError::Io` if the current directory is unavailable
    pub fn from_config(config: &SynthConfig) -> Result<Self, SynthError> {
        let root = if config.root.is_absolute() {
            config.root.clone()
        } else {
            let cwd = std::env::current_dir().map_err(|e| SynthError::io_error(&config.root, e))?;
            cwd.join(&config.root)
        };
        Ok(Self {
            data_dir: root.join(&config.data_dir),
            routines_dir: root.join(&config.routines_dir),
            oracles_dir: root.join(&config.oracles_dir),
            document_extensions: config
                .document_extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            reference_extension: config
                .reference_extension
                .trim()
                .trim_start_matches('.')
                .to_ascii_lowercase(),
            root,
        })
    }

    /// Create the workspace directories; a no-op when they exist
    ///
    /// # Errors
    /// Returns `SynthError::Io` if a directory cannot be created
    pub fn ensure(&self) -> Result<(), SynthError> {
        for dir in [&self.data_dir, &self.routines_dir, &self.oracles_dir] {
            std::fs::create_dir_all(dir).map_err(|e| SynthError::io_error(dir, e))?;
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[inline]
    #[must_use]
    pub fn routines_dir(&self) -> &Path {
        &self.routines_dir
    }

    #[inline]
    #[must_use]
    pub fn oracles_dir(&self) -> &Path {
        &self.oracles_dir
    }

    /// Sample asset directory for `target`
    #[must_use]
    pub fn target_dir(&self, target: &TargetId) -> PathBuf {
        self.data_dir.join(target.as_str())
    }

    /// Persisted routine location for a routine name
    #[must_use]
    pub fn routine_file(&self, routine_name: &str) -> PathBuf {
        self.routines_dir
            .join(format!("{routine_name}.{ARTIFACT_EXTENSION}"))
    }

    /// Persisted routine location for `target`
    #[must_use]
    pub fn routine_path(&self, target: &TargetId) -> PathBuf {
        self.routine_file(&target.routine_name())
    }

    /// Persisted oracle location for `target`
    #[must_use]
    pub fn oracle_path(&self, target: &TargetId) -> PathBuf {
        self.oracles_dir
            .join(format!("{}.{ARTIFACT_EXTENSION}", target.oracle_name()))
    }

    /// Find the sample document and reference table for `target`
    ///
    /// Takes the first directory entry with a matching extension; document
    /// extensions are tried in configured order. Entry order within one
    /// extension is whatever the filesystem yields.
    ///
    /// # Errors
    /// Returns `SynthError::AssetNotFound` naming the first missing asset
    pub fn locate_assets(&self, target: &TargetId) -> Result<Assets, SynthError> {
        let dir = self.target_dir(target);
        let not_found = |missing| SynthError::AssetNotFound {
            target: target.to_string(),
            dir: dir.clone(),
            missing,
        };

        let files: Vec<PathBuf> = match std::fs::read_dir(&dir) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(SynthError::io_error(&dir, e)),
        };

        let sample_input = self
            .document_extensions
            .iter()
            .find_map(|ext| first_with_extension(&files, ext))
            .ok_or_else(|| not_found(AssetKind::SampleDocument))?;
        let reference_table = first_with_extension(&files, &self.reference_extension)
            .ok_or_else(|| not_found(AssetKind::ReferenceTable))?;

        Ok(Assets {
            sample_input,
            reference_table,
        })
    }

    /// Hash of the routine currently persisted for `target`
    ///
    /// # Errors
    /// Returns `SynthError::Io` on read failures other than absence
    pub fn routine_hash(&self, target: &TargetId) -> Result<Option<ContentHash>, SynthError> {
        let path = self.routine_path(target);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(ContentHash::compute(&bytes))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SynthError::io_error(path, e)),
        }
    }
}

fn first_with_extension(files: &[PathBuf], ext: &str) -> Option<PathBuf> {
    files
        .iter()
        .find(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ext))
        })
        .cloned()
}

/// Replace `path` with `text` in one step and return the hash of what was
/// written
///
/// The text goes to a sibling temporary file which is then renamed over the
/// target, so readers only ever see a complete artifact.
///
/// # Errors
/// Returns `SynthError::Io` if the write or rename fails
pub async fn persist(path: &Path, text: &str) -> Result<ContentHash, SynthError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SynthError::io_error(parent, e))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, text.as_bytes())
        .await
        .map_err(|e| SynthError::io_error(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| SynthError::io_error(path, e))?;

    Ok(ContentHash::compute(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace(root: &Path) -> Workspace {
        Workspace::from_config(&SynthConfig::default().with_root(root)).unwrap()
    }

    #[test]
    fn ensure_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let ws = workspace(dir.path());
        ws.ensure().unwrap();
        ws.ensure().unwrap();
        assert!(ws.routines_dir().is_dir());
        assert!(ws.oracles_dir().is_dir());
        assert!(ws.data_dir().is_dir());
    }

    #[test]
    fn artifact_paths_follow_naming_convention() {
        let dir = tempfile::tempdir().unwrap();
        let ws = workspace(dir.path());
        let target = TargetId::new("ICICI").unwrap();
        assert!(ws.routine_path(&target).ends_with("custom_parsers/icici_parser.toml"));
        assert!(ws.oracle_path(&target).ends_with("oracles/test_icici.toml"));
        assert!(ws.target_dir(&target).ends_with("data/icici"));
    }

    #[test]
    fn locate_assets_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let ws = workspace(dir.path());
        let target = TargetId::new("icici").unwrap();
        let target_dir = ws.target_dir(&target);
        std::fs::create_dir_all(&target_dir).unwrap();
        std::fs::write(target_dir.join("notes.md"), "ignored").unwrap();
        std::fs::write(target_dir.join("icici sample.PDF"), "%PDF").unwrap();
        std::fs::write(target_dir.join("result.csv"), "Date\n").unwrap();

        let assets = ws.locate_assets(&target).unwrap();
        assert!(assets.sample_input.ends_with("icici sample.PDF"));
        assert!(assets.reference_table.ends_with("result.csv"));
    }

    #[test]
    fn missing_directory_reports_document() {
        let dir = tempfile::tempdir().unwrap();
        let ws = workspace(dir.path());
        let err = ws.locate_assets(&TargetId::new("sbi").unwrap()).unwrap_err();
        assert!(matches!(
            err,
            SynthError::AssetNotFound {
                missing: AssetKind::SampleDocument,
                ..
            }
        ));
    }

    #[test]
    fn missing_reference_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ws = workspace(dir.path());
        let target = TargetId::new("sbi").unwrap();
        std::fs::create_dir_all(ws.target_dir(&target)).unwrap();
        std::fs::write(ws.target_dir(&target).join("statement.txt"), "text").unwrap();

        let err = ws.locate_assets(&target).unwrap_err();
        assert!(matches!(
            err,
            SynthError::AssetNotFound {
                missing: AssetKind::ReferenceTable,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn persist_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/routine.toml");

        persist(&path, "first").await.unwrap();
        let hash = persist(&path, "second").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(hash, ContentHash::compute(b"second"));
        assert!(!dir.path().join("nested/routine.toml.tmp").exists());
    }
}
