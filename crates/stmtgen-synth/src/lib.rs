//! stmtgen synthesis
//!
//! Produces a statement-extraction routine for a target by instantiating a
//! fixed template, validating it against a generated oracle, and retrying
//! with a different fallback variant until the oracle passes or the attempt
//! budget runs out.
//!
//! # Components
//!
//! - [`RoutineTemplate`]: fixed routine skeleton with schema and fallback
//!   substitution points
//! - [`FallbackGenerator`]: deterministic attempt-to-variant mapping
//! - [`OracleGenerator`]: acceptance test pinning sample and reference
//! - [`ValidationRunner`]: isolated oracle execution
//! - [`Synthesizer`]: the bounded retry controller
//!
//! # Example
//!
//! ```rust,ignore
//! use stmtgen_synth::prelude::*;
//!
//! let synth = Synthesizer::from_config(SynthConfig::default(), None)?;
//! let report = synth.synthesize("icici").await?;
//! println!("converged on attempt {}", report.attempts.len());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod controller;
pub mod error;
pub mod fallback;
pub mod oracle;
pub mod registry;
pub mod routine;
pub mod runner;
pub mod target;
pub mod template;
pub mod types;
pub mod workspace;

pub use config::{RunnerKind, SynthConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY_MS};
pub use controller::{SynthesisState, Synthesizer};
pub use error::{ConfigError, OracleError, RoutineError, RunnerError, SynthError};
pub use fallback::{FallbackBody, FallbackGenerator, FallbackStrategy};
pub use oracle::{OracleGenerator, OracleOutcome, OracleTest};
pub use registry::RoutineRegistry;
pub use routine::{Routine, TemplateRoutine};
pub use runner::{build_runner, InProcessRunner, RunOutput, SubprocessRunner, ValidationRunner};
pub use target::TargetId;
pub use template::{RoutineManifest, RoutineSource, RoutineTemplate};
pub use types::{AssetKind, Assets, AttemptRecord, SynthesisReport, TargetStatus, Verdict};
pub use workspace::Workspace;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving synthesis
    pub use crate::{
        Routine, RoutineRegistry, RunnerKind, SynthConfig, SynthError, SynthesisReport,
        Synthesizer, TargetId, ValidationRunner, Verdict, Workspace,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
