//! Oracle execution
//!
//! The controller hands an oracle path to a [`ValidationRunner`] and waits
//! for its exit status and captured output. Two isolation levels:
//! - [`SubprocessRunner`]: a fresh process per run (`<exe> ... oracle <path>`),
//!   so a crashing routine cannot take the controller down
//! - [`InProcessRunner`]: a blocking worker thread sharing the registry

use crate::config::{RunnerKind, SynthConfig};
use crate::error::RunnerError;
use crate::oracle::{OracleTest, EXIT_ORACLE_ERROR};
use crate::registry::RoutineRegistry;
use crate::types::Verdict;
use crate::workspace::Workspace;
use std::ffi::OsString;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

/// Exit status reported when a routine panics under [`InProcessRunner`]
pub const EXIT_PANIC: i32 = 101;

/// Log filter passed to subprocess oracles
pub const CHILD_LOG_LEVEL: &str = "warn";

/// Captured result of one validation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub exit_status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        Verdict::from_exit_status(self.exit_status)
    }

    /// Stdout then stderr, trimmed, blank streams omitted
    #[must_use]
    pub fn diagnostic(&self) -> String {
        [self.stdout.trim(), self.stderr.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Executes a persisted oracle and captures its outcome
#[async_trait::async_trait]
pub trait ValidationRunner: Send + Sync + Debug {
    /// Run the oracle at `oracle`
    ///
    /// A failing verdict or a crashed routine is an `Ok` output with a
    /// non-zero status. `Err` means the run could not happen at all.
    async fn run(&self, oracle: &Path) -> Result<RunOutput, RunnerError>;
}

/// Runs each oracle in a child process
#[derive(Debug, Clone)]
pub struct SubprocessRunner {
    program: PathBuf,
    args: Vec<OsString>,
}

impl SubprocessRunner {
    /// Runner invoking `program <args...> <oracle>`
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, args: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Runner re-invoking the current executable's `oracle` subcommand with
    /// the settings the child needs to resolve routines the same way
    ///
    /// # Errors
    /// Returns `RunnerError::CurrentExe` if the executable path is unknown
    pub fn current_exe(
        config: &SynthConfig,
        workspace: &Workspace,
        config_file: Option<&Path>,
    ) -> Result<Self, RunnerError> {
        let program = std::env::current_exe().map_err(RunnerError::CurrentExe)?;
        let mut args: Vec<OsString> = Vec::new();
        if let Some(file) = config_file {
            args.push("--config".into());
            args.push(file.into());
        }
        args.push("--root".into());
        args.push(workspace.root().into());
        args.push("--engine".into());
        args.push(config.engine.as_str().into());
        args.push("--pdftotext".into());
        args.push(config.pdftotext_bin.clone().into());
        // Captured stderr becomes the attempt diagnostic
        args.push("--log-level".into());
        args.push(CHILD_LOG_LEVEL.into());
        args.push("oracle".into());
        Ok(Self::new(program, args))
    }
}

#[async_trait::async_trait]
impl ValidationRunner for SubprocessRunner {
    async fn run(&self, oracle: &Path) -> Result<RunOutput, RunnerError> {
        tracing::debug!(program = %self.program.display(), oracle = %oracle.display(), "spawning oracle");
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(oracle)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RunnerError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        Ok(RunOutput {
            // Killed by a signal
            exit_status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs each oracle on a blocking worker thread
#[derive(Debug, Clone)]
pub struct InProcessRunner {
    workspace: Arc<Workspace>,
    registry: Arc<RoutineRegistry>,
}

impl InProcessRunner {
    #[must_use]
    pub fn new(workspace: Arc<Workspace>, registry: Arc<RoutineRegistry>) -> Self {
        Self {
            workspace,
            registry,
        }
    }
}

#[async_trait::async_trait]
impl ValidationRunner for InProcessRunner {
    async fn run(&self, oracle: &Path) -> Result<RunOutput, RunnerError> {
        let oracle = oracle.to_path_buf();
        let workspace = Arc::clone(&self.workspace);
        let registry = Arc::clone(&self.registry);

        let joined = tokio::task::spawn_blocking(move || {
            OracleTest::load(&oracle).map(|test| test.execute(&workspace, &registry))
        })
        .await;

        Ok(match joined {
            Ok(Ok(outcome)) => RunOutput {
                exit_status: outcome.exit_code(),
                stdout: outcome.report,
                stderr: String::new(),
            },
            Ok(Err(e)) => RunOutput {
                exit_status: EXIT_ORACLE_ERROR,
                stdout: String::new(),
                stderr: e.to_string(),
            },
            Err(e) => RunOutput {
                exit_status: EXIT_PANIC,
                stdout: String::new(),
                stderr: format!("routine crashed: {e}"),
            },
        })
    }
}

/// Build the runner selected by [`SynthConfig::runner_kind`]
///
/// # Errors
/// Returns `RunnerError::CurrentExe` for a subprocess runner whose
/// executable path is unknown
pub fn build_runner(
    config: &SynthConfig,
    workspace: Arc<Workspace>,
    registry: Arc<RoutineRegistry>,
    config_file: Option<&Path>,
) -> Result<Arc<dyn ValidationRunner>, RunnerError> {
    Ok(match config.runner_kind() {
        RunnerKind::Subprocess => Arc::new(SubprocessRunner::current_exe(
            config,
            &workspace,
            config_file,
        )?),
        RunnerKind::InProcess => Arc::new(InProcessRunner::new(workspace, registry)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stmtgen_extract::PlainTextEngine;

    #[test]
    fn diagnostic_joins_streams() {
        let output = RunOutput {
            exit_status: 1,
            stdout: "FAIL x_parser: row count mismatch\n".to_string(),
            stderr: "  ".to_string(),
        };
        assert_eq!(output.diagnostic(), "FAIL x_parser: row count mismatch");
        assert_eq!(output.verdict(), Verdict::Fail);
    }

    #[tokio::test]
    async fn in_process_reports_unloadable_oracle() {
        let dir = tempfile::tempdir().unwrap();
        let workspace =
            Arc::new(Workspace::from_config(&SynthConfig::default().with_root(dir.path())).unwrap());
        let registry = Arc::new(RoutineRegistry::new(Arc::new(PlainTextEngine)));
        let runner = InProcessRunner::new(workspace, registry);

        let output = runner.run(&dir.path().join("missing.toml")).await.unwrap();
        assert_eq!(output.exit_status, EXIT_ORACLE_ERROR);
        assert!(output.stderr.contains("missing.toml"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn subprocess_captures_status_and_output() {
        let runner = SubprocessRunner::new(
            "sh",
            vec!["-c".into(), "echo FAIL from oracle $0; exit 1".into()],
        );
        let output = runner.run(Path::new("test_icici.toml")).await.unwrap();
        assert_eq!(output.exit_status, 1);
        assert_eq!(output.stdout.trim(), "FAIL from oracle test_icici.toml");
    }

    #[test]
    fn default_config_builds_in_process_runner() {
        let dir = tempfile::tempdir().unwrap();
        let config = SynthConfig::default().with_root(dir.path());
        let workspace = Arc::new(Workspace::from_config(&config).unwrap());
        let registry = Arc::new(RoutineRegistry::new(Arc::new(PlainTextEngine)));
        let runner = build_runner(&config, workspace, registry, None).unwrap();
        assert!(format!("{runner:?}").starts_with("InProcessRunner"));
    }

    #[test]
    fn current_exe_forwards_settings_and_quiets_logs() {
        let dir = tempfile::tempdir().unwrap();
        let config = SynthConfig::default()
            .with_root(dir.path())
            .with_runner(RunnerKind::Subprocess);
        let workspace = Workspace::from_config(&config).unwrap();
        let runner = SubprocessRunner::current_exe(&config, &workspace, None).unwrap();

        let args: Vec<String> = runner
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let level = args.iter().position(|a| a == "--log-level").unwrap();
        assert_eq!(args[level + 1], CHILD_LOG_LEVEL);
        assert_eq!(args.last().map(String::as_str), Some("oracle"));
        assert!(!args.iter().any(|a| a == "--config"));
    }

    #[tokio::test]
    async fn subprocess_spawn_failure_is_error() {
        let runner = SubprocessRunner::new("/nonexistent/stmtgen", Vec::new());
        let result = runner.run(Path::new("test_icici.toml")).await;
        assert!(matches!(result, Err(RunnerError::Spawn { .. })));
    }
}
