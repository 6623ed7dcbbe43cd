//! Synthesis controller
//!
//! Drives one bounded run per target:
//!
//! ```text
//! LocateAssets -> DeriveSchema -> EmitOracle -> Attempt(1) -> ... -> Attempt(n)
//!                                                  |                    |
//!                                                 Done              Exhausted
//! ```
//!
//! Attempt `k` instantiates the template with fallback variant `k`,
//! persists it over the previous routine, runs the oracle and records the
//! verdict. The controller is the only writer of routine and oracle files,
//! and attempts within a run are strictly sequential.

use crate::config::SynthConfig;
use crate::error::SynthError;
use crate::fallback::FallbackGenerator;
use crate::oracle::{OracleGenerator, OracleOutcome, OracleTest};
use crate::registry::RoutineRegistry;
use crate::runner::{build_runner, ValidationRunner};
use crate::target::TargetId;
use crate::template::RoutineTemplate;
use crate::types::{AttemptRecord, SynthesisReport, TargetStatus, Verdict};
use crate::workspace::{persist, Workspace};
use chrono::Utc;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stmtgen_extract::build_engine;
use stmtgen_table::{read_schema, Table};
use tracing::Instrument;
use ulid::Ulid;

/// Controller states, logged on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisState {
    LocateAssets,
    DeriveSchema,
    EmitOracle,
    Attempt(u32),
    Done,
    Exhausted,
}

impl Display for SynthesisState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SynthesisState::LocateAssets => write!(f, "locate-assets"),
            SynthesisState::DeriveSchema => write!(f, "derive-schema"),
            SynthesisState::EmitOracle => write!(f, "emit-oracle"),
            SynthesisState::Attempt(k) => write!(f, "attempt-{k}"),
            SynthesisState::Done => write!(f, "done"),
            SynthesisState::Exhausted => write!(f, "exhausted"),
        }
    }
}

fn enter(state: SynthesisState) {
    tracing::debug!(state = %state, "synthesis state");
}

/// Bounded self-correcting routine synthesizer
#[derive(Debug)]
pub struct Synthesizer {
    config: SynthConfig,
    workspace: Arc<Workspace>,
    registry: Arc<RoutineRegistry>,
    runner: Arc<dyn ValidationRunner>,
    fallback: FallbackGenerator,
    oracles: OracleGenerator,
}

impl Synthesizer {
    /// Create a synthesizer from already-built parts
    #[must_use]
    pub fn new(
        config: SynthConfig,
        workspace: Arc<Workspace>,
        registry: Arc<RoutineRegistry>,
        runner: Arc<dyn ValidationRunner>,
    ) -> Self {
        Self {
            config,
            workspace,
            registry,
            runner,
            fallback: FallbackGenerator::new(),
            oracles: OracleGenerator,
        }
    }

    /// Build engine, registry and runner from `config`
    ///
    /// `config_file` is forwarded to subprocess oracles.
    ///
    /// # Errors
    /// Returns `SynthError` if the configuration is invalid, the workspace
    /// cannot be created, or the runner cannot be built
    pub fn from_config(config: SynthConfig, config_file: Option<&Path>) -> Result<Self, SynthError> {
        config.validate()?;
        let workspace = Arc::new(Workspace::from_config(&config)?);
        workspace.ensure()?;
        let engine = build_engine(config.engine, config.pdftotext_bin.clone());
        let registry = Arc::new(RoutineRegistry::new(engine));
        let runner = build_runner(&config, Arc::clone(&workspace), Arc::clone(&registry), config_file)?;
        Ok(Self::new(config, workspace, registry, runner))
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn workspace(&self) -> &Arc<Workspace> {
        &self.workspace
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<RoutineRegistry> {
        &self.registry
    }

    /// Synthesize a routine for `target`, overwriting any existing one
    ///
    /// # Errors
    /// - `SynthError::InvalidTarget` for a malformed identifier
    /// - `SynthError::AssetNotFound` before any attempt is made
    /// - `SynthError::SynthesisExhausted` after the last failing attempt
    pub async fn synthesize(&self, target: &str) -> Result<SynthesisReport, SynthError> {
        let target = TargetId::new(target)?;
        let run_id = Ulid::new();
        let span = tracing::info_span!("synthesis", target = %target, run_id = %run_id);
        self.run(target, run_id).instrument(span).await
    }

    async fn run(&self, target: TargetId, run_id: Ulid) -> Result<SynthesisReport, SynthError> {
        tracing::info!("Synthesizing routine for {}", target);

        enter(SynthesisState::LocateAssets);
        let assets = self.workspace.locate_assets(&target)?;
        tracing::debug!(
            sample = %assets.sample_input.display(),
            reference = %assets.reference_table.display(),
            "assets located"
        );

        enter(SynthesisState::DeriveSchema);
        let schema = read_schema(&assets.reference_table)?;
        tracing::info!("Target schema: {}", schema);

        enter(SynthesisState::EmitOracle);
        let oracle_path = self.workspace.oracle_path(&target);
        self.oracles
            .generate(&target, &assets)
            .write(&oracle_path)
            .await?;

        let template = RoutineTemplate::new(&target);
        let routine_path = self.workspace.routine_path(&target);
        let max_attempts = self.config.max_attempts;
        let mut attempts = Vec::with_capacity(max_attempts as usize);

        for k in 1..=max_attempts {
            enter(SynthesisState::Attempt(k));
            let started_at = Utc::now();
            let fallback = self.fallback.variant_for(k);
            tracing::info!("Attempt {}/{} using {} fallback", k, max_attempts, fallback.variant);
            let source = template.instantiate(&schema, &fallback)?;
            let routine_hash = persist(&routine_path, source.text()).await?;
            self.registry.install(&target, &source)?;

            let (verdict, diagnostic) = match self.runner.run(&oracle_path).await {
                Ok(output) => (output.verdict(), output.diagnostic()),
                Err(e) => {
                    let error = SynthError::from(e);
                    if !error.is_retryable() {
                        return Err(error);
                    }
                    (Verdict::Fail, format!("oracle did not run: {error}"))
                }
            };
            let record = AttemptRecord {
                attempt: k,
                variant: fallback.variant,
                verdict,
                diagnostic,
                routine_hash,
                started_at,
            };

            if verdict == Verdict::Pass {
                tracing::info!("Attempt {}/{} passed with {} fallback", k, max_attempts, fallback.variant);
                attempts.push(record);
                enter(SynthesisState::Done);
                return Ok(SynthesisReport {
                    run_id,
                    target,
                    schema,
                    routine_path,
                    oracle_path,
                    attempts,
                });
            }

            tracing::warn!(
                "Attempt {}/{} failed with {} fallback: {}",
                k,
                max_attempts,
                fallback.variant,
                record.diagnostic
            );
            attempts.push(record);

            if k < max_attempts && !self.config.retry_delay().is_zero() {
                tokio::time::sleep(self.config.retry_delay()).await;
            }
        }

        enter(SynthesisState::Exhausted);
        let last_diagnostic = attempts
            .last()
            .map(|a| a.diagnostic.clone())
            .unwrap_or_default();
        tracing::error!("Parser generation failed for {} after {} attempts", target, max_attempts);
        Err(SynthError::SynthesisExhausted {
            target: target.to_string(),
            attempts: max_attempts,
            last_diagnostic,
        })
    }

    /// Synthesize only if no routine is persisted for `target`
    ///
    /// Returns `None` when an existing routine was kept.
    ///
    /// # Errors
    /// Returns the errors of [`Self::synthesize`]
    pub async fn ensure_routine(&self, target: &str) -> Result<Option<SynthesisReport>, SynthError> {
        let id = TargetId::new(target)?;
        if self.workspace.routine_path(&id).is_file() {
            tracing::debug!("Routine for {} already present", id);
            return Ok(None);
        }
        self.synthesize(target).await.map(Some)
    }

    /// Parse `input` with `target`'s routine, synthesizing it first if absent
    ///
    /// # Errors
    /// Returns synthesis errors, routine load errors, or
    /// `SynthError::RoutinePanicked`
    pub async fn parse_document(&self, target: &str, input: &Path) -> Result<Table, SynthError> {
        let id = TargetId::new(target)?;
        self.ensure_routine(target).await?;
        let routine = self.registry.resolve(&id, &self.workspace.routine_path(&id))?;

        let input: PathBuf = input.to_path_buf();
        tracing::info!("Parsing {} with {}", input.display(), routine.name());
        tokio::task::spawn_blocking(move || routine.parse(&input))
            .await
            .map_err(|e| SynthError::RoutinePanicked(e.to_string()))
    }

    /// What the workspace holds for `target`
    ///
    /// # Errors
    /// Returns `SynthError::InvalidTarget` or IO errors other than absence
    pub fn status(&self, target: &str) -> Result<TargetStatus, SynthError> {
        let id = TargetId::new(target)?;
        let oracle_path = self.workspace.oracle_path(&id);
        Ok(TargetStatus {
            assets: self.workspace.locate_assets(&id).ok(),
            routine_path: self.workspace.routine_path(&id),
            routine_hash: self.workspace.routine_hash(&id)?,
            oracle_present: oracle_path.is_file(),
            oracle_path,
            target: id,
        })
    }

    /// Execute a persisted oracle once, outside any synthesis run
    ///
    /// # Errors
    /// Returns `SynthError::Oracle` if the oracle cannot be loaded
    pub fn execute_oracle(&self, oracle: &Path) -> Result<OracleOutcome, SynthError> {
        let test = OracleTest::load(oracle)?;
        Ok(test.execute(&self.workspace, &self.registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_display() {
        assert_eq!(SynthesisState::Attempt(2).to_string(), "attempt-2");
        assert_eq!(SynthesisState::Exhausted.to_string(), "exhausted");
    }
}
