//! Generated acceptance tests
//!
//! An oracle pins one target's sample document and reference table. It is a
//! function of those inputs only, so regenerating it for unchanged assets
//! yields byte-identical text. Executing it resolves the routine by name at
//! run time, never at generation time.

use crate::error::{OracleError, SynthError};
use crate::registry::RoutineRegistry;
use crate::target::TargetId;
use crate::types::{Assets, Verdict};
use crate::workspace::{persist, Workspace};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stmtgen_table::{compare, read_table, ContentHash};

/// Exit status of a passing oracle
pub const EXIT_PASS: i32 = 0;
/// Exit status of a failing oracle
pub const EXIT_FAIL: i32 = 1;
/// Exit status when the oracle file itself cannot be loaded
pub const EXIT_ORACLE_ERROR: i32 = 2;

#[derive(Debug, Serialize, Deserialize)]
struct OracleFile {
    oracle: OracleTest,
}

/// Acceptance test for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleTest {
    pub target: TargetId,
    /// Routine name the test resolves when executed
    pub routine: String,
    pub sample_input: PathBuf,
    pub reference_table: PathBuf,
}

/// Result of executing an oracle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleOutcome {
    pub verdict: Verdict,
    pub report: String,
}

impl OracleOutcome {
    fn pass(report: String) -> Self {
        Self {
            verdict: Verdict::Pass,
            report,
        }
    }

    fn fail(report: String) -> Self {
        Self {
            verdict: Verdict::Fail,
            report,
        }
    }

    /// Process exit status carrying the verdict
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self.verdict {
            Verdict::Pass => EXIT_PASS,
            Verdict::Fail => EXIT_FAIL,
        }
    }
}

/// Builds oracles from located assets
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleGenerator;

impl OracleGenerator {
    /// Oracle for `target` over `assets`
    #[must_use]
    pub fn generate(&self, target: &TargetId, assets: &Assets) -> OracleTest {
        OracleTest {
            target: target.clone(),
            routine: target.routine_name(),
            sample_input: assets.sample_input.clone(),
            reference_table: assets.reference_table.clone(),
        }
    }
}

impl OracleTest {
    /// Render to persisted text
    ///
    /// # Errors
    /// Returns `OracleError::Render` if serialization fails
    pub fn render(&self) -> Result<String, OracleError> {
        let body = toml::to_string_pretty(&OracleFile {
            oracle: self.clone(),
        })?;
        Ok(format!(
            "# Generated by stmtgen; asserts {} reproduces {}.\n\n{body}",
            self.routine,
            self.reference_table.display()
        ))
    }

    /// Render and persist to `path`, replacing any previous oracle
    ///
    /// # Errors
    /// Returns `SynthError` if rendering or the write fails
    pub async fn write(&self, path: &Path) -> Result<ContentHash, SynthError> {
        let text = self.render()?;
        persist(path, &text).await
    }

    /// Load a persisted oracle
    ///
    /// # Errors
    /// Returns `OracleError` if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OracleError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| OracleError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file: OracleFile = toml::from_str(&text).map_err(|e| OracleError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(file.oracle)
    }

    /// Run the test: resolve the routine by name, parse the sample and
    /// compare against the reference
    ///
    /// Never fails; every problem becomes a failing verdict with a report.
    #[must_use]
    pub fn execute(&self, workspace: &Workspace, registry: &RoutineRegistry) -> OracleOutcome {
        let reference = match read_table(&self.reference_table) {
            Ok(table) => table,
            Err(e) => {
                return OracleOutcome::fail(format!("FAIL {}: cannot read reference: {e}", self.routine));
            }
        };

        let routine_path = workspace.routine_file(&self.routine);
        let routine = match registry.resolve(&self.target, &routine_path) {
            Ok(routine) => routine,
            Err(e) => {
                return OracleOutcome::fail(format!("FAIL {}: cannot load routine: {e}", self.routine));
            }
        };

        let produced = routine.parse(&self.sample_input);
        match compare(&produced, &reference) {
            Ok(()) => OracleOutcome::pass(format!(
                "PASS {}: {} rows match {}",
                self.routine,
                reference.len(),
                self.reference_table.display()
            )),
            Err(mismatch) => OracleOutcome::fail(format!("FAIL {}: {mismatch}", self.routine)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SynthConfig;
    use crate::fallback::FallbackStrategy;
    use crate::template::RoutineTemplate;
    use std::sync::Arc;
    use stmtgen_extract::PlainTextEngine;
    use stmtgen_table::Schema;

    struct Fixture {
        _dir: tempfile::TempDir,
        workspace: Workspace,
        target: TargetId,
        assets: Assets,
    }

    fn fixture(document: &str, reference: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::from_config(&SynthConfig::default().with_root(dir.path())).unwrap();
        workspace.ensure().unwrap();
        let target = TargetId::new("icici").unwrap();
        let target_dir = workspace.target_dir(&target);
        std::fs::create_dir_all(&target_dir).unwrap();
        std::fs::write(target_dir.join("statement.txt"), document).unwrap();
        std::fs::write(target_dir.join("result.csv"), reference).unwrap();
        let assets = workspace.locate_assets(&target).unwrap();
        Fixture {
            _dir: dir,
            workspace,
            target,
            assets,
        }
    }

    fn write_routine(fx: &Fixture, variant: FallbackStrategy) {
        let schema = Schema::new(["Date", "Description", "Amount"]).unwrap();
        let source = RoutineTemplate::new(&fx.target)
            .instantiate(&schema, &variant.body())
            .unwrap();
        std::fs::write(fx.workspace.routine_path(&fx.target), source.text()).unwrap();
    }

    const REFERENCE: &str = "Date,Description,Amount\n01-08-2024,Salary Credit,100.00\n02-08-2024,Rent Payment,50.00\n";

    #[test]
    fn generate_is_idempotent() {
        let fx = fixture("", REFERENCE);
        let a = OracleGenerator.generate(&fx.target, &fx.assets);
        let b = OracleGenerator.generate(&fx.target, &fx.assets);
        assert_eq!(a.render().unwrap(), b.render().unwrap());
        assert_eq!(a.routine, "icici_parser");
    }

    #[tokio::test]
    async fn write_and_load_agree() {
        let fx = fixture("", REFERENCE);
        let oracle = OracleGenerator.generate(&fx.target, &fx.assets);
        let path = fx.workspace.oracle_path(&fx.target);
        let first = oracle.write(&path).await.unwrap();
        let second = oracle.write(&path).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(OracleTest::load(&path).unwrap(), oracle);
    }

    #[test]
    fn execute_passes_matching_routine() {
        let fx = fixture(
            "01-08-2024 Salary Credit 100.00\n02-08-2024 Rent Payment 50.00\n",
            REFERENCE,
        );
        write_routine(&fx, FallbackStrategy::Classic);
        let registry = RoutineRegistry::new(Arc::new(PlainTextEngine));
        let outcome = OracleGenerator
            .generate(&fx.target, &fx.assets)
            .execute(&fx.workspace, &registry);
        assert_eq!(outcome.verdict, Verdict::Pass, "{}", outcome.report);
        assert_eq!(outcome.exit_code(), EXIT_PASS);
    }

    #[test]
    fn execute_reports_row_count() {
        let fx = fixture("01-08-2024 Salary Credit 100.00\n", REFERENCE);
        write_routine(&fx, FallbackStrategy::Classic);
        let registry = RoutineRegistry::new(Arc::new(PlainTextEngine));
        let outcome = OracleGenerator
            .generate(&fx.target, &fx.assets)
            .execute(&fx.workspace, &registry);
        assert_eq!(outcome.verdict, Verdict::Fail);
        assert!(outcome.report.contains("row count mismatch: expected 2 rows, parsed 1"));
    }

    #[test]
    fn execute_without_routine_fails() {
        let fx = fixture("", REFERENCE);
        let registry = RoutineRegistry::new(Arc::new(PlainTextEngine));
        let outcome = OracleGenerator
            .generate(&fx.target, &fx.assets)
            .execute(&fx.workspace, &registry);
        assert_eq!(outcome.verdict, Verdict::Fail);
        assert!(outcome.report.contains("cannot load routine"));
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_x.toml");
        std::fs::write(&path, "[oracle]\ntarget = 'bad target'\n").unwrap();
        assert!(matches!(OracleTest::load(&path), Err(OracleError::Parse { .. })));
    }
}
