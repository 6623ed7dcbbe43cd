//! Late-bound routine resolution
//!
//! Routines are resolved by target at call time. A persisted routine is
//! re-read on every resolve and recompiled only when its content hash
//! changes, so a resolve after a rewrite always sees the new text.

use crate::error::RoutineError;
use crate::routine::{Routine, TemplateRoutine};
use crate::target::TargetId;
use crate::template::RoutineSource;
use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;
use stmtgen_extract::ExtractionEngine;
use stmtgen_table::ContentHash;

#[derive(Debug, Clone)]
struct Entry {
    /// `None` for routines registered directly rather than loaded from text
    hash: Option<ContentHash>,
    routine: Arc<dyn Routine>,
}

/// Registry of compiled routines keyed by target
#[derive(Debug)]
pub struct RoutineRegistry {
    engine: Arc<dyn ExtractionEngine>,
    entries: DashMap<TargetId, Entry>,
}

impl RoutineRegistry {
    /// Create an empty registry whose routines extract with `engine`
    #[must_use]
    pub fn new(engine: Arc<dyn ExtractionEngine>) -> Self {
        Self {
            engine,
            entries: DashMap::new(),
        }
    }

    /// Engine handed to compiled routines
    #[must_use]
    pub fn engine(&self) -> Arc<dyn ExtractionEngine> {
        Arc::clone(&self.engine)
    }

    /// Compile `source` and make it the current routine for `target`
    ///
    /// # Errors
    /// Returns `RoutineError` if the source does not compile
    pub fn install(
        &self,
        target: &TargetId,
        source: &RoutineSource,
    ) -> Result<Arc<dyn Routine>, RoutineError> {
        if let Some(existing) = self.cached(target, source.hash()) {
            return Ok(existing);
        }
        let routine: Arc<dyn Routine> =
            Arc::new(TemplateRoutine::from_source(source, self.engine())?);
        self.entries.insert(
            target.clone(),
            Entry {
                hash: Some(source.hash()),
                routine: Arc::clone(&routine),
            },
        );
        tracing::debug!(target = %target, hash = %source.hash().short(), "routine installed");
        Ok(routine)
    }

    /// Register a hand-built routine; it is returned by [`Self::resolve`]
    /// without consulting the filesystem until replaced
    pub fn register(&self, target: &TargetId, routine: Arc<dyn Routine>) {
        self.entries
            .insert(target.clone(), Entry { hash: None, routine });
    }

    /// Resolve the routine for `target`, loading `path` if the persisted
    /// text differs from what is compiled
    ///
    /// # Errors
    /// - `RoutineError::NotFound` if nothing is registered and `path` is absent
    /// - `RoutineError::Io` if `path` cannot be read
    /// - `RoutineError::Manifest`/`Pattern` if the persisted text is invalid
    pub fn resolve(&self, target: &TargetId, path: &Path) -> Result<Arc<dyn Routine>, RoutineError> {
        if let Some(entry) = self.entries.get(target) {
            if entry.hash.is_none() {
                return Ok(Arc::clone(&entry.routine));
            }
        }

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RoutineError::NotFound(path.to_path_buf()));
            }
            Err(e) => {
                return Err(RoutineError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        self.install(target, &RoutineSource::from_text(target.routine_name(), text))
    }

    /// Currently compiled routine, without touching the filesystem
    #[must_use]
    pub fn get(&self, target: &TargetId) -> Option<Arc<dyn Routine>> {
        self.entries.get(target).map(|e| Arc::clone(&e.routine))
    }

    /// Hash of the compiled routine text, if loaded from text
    #[must_use]
    pub fn current_hash(&self, target: &TargetId) -> Option<ContentHash> {
        self.entries.get(target).and_then(|e| e.hash)
    }

    /// Drop the routine for `target`
    pub fn evict(&self, target: &TargetId) -> bool {
        self.entries.remove(target).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn cached(&self, target: &TargetId, hash: ContentHash) -> Option<Arc<dyn Routine>> {
        self.entries
            .get(target)
            .filter(|e| e.hash == Some(hash))
            .map(|e| Arc::clone(&e.routine))
    }
}
