//! Records produced by a synthesis run

use crate::fallback::FallbackStrategy;
use crate::target::TargetId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use stmtgen_table::{ContentHash, Schema};
use ulid::Ulid;

/// Sample asset kinds located per target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    SampleDocument,
    ReferenceTable,
}

impl Display for AssetKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::SampleDocument => write!(f, "sample document"),
            AssetKind::ReferenceTable => write!(f, "reference table"),
        }
    }
}

/// Located sample assets for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assets {
    pub sample_input: PathBuf,
    pub reference_table: PathBuf,
}

/// Binary oracle outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    /// Verdict implied by a validation exit status
    #[inline]
    #[must_use]
    pub fn from_exit_status(status: i32) -> Self {
        if status == 0 {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    #[inline]
    #[must_use]
    pub fn is_pass(self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Fail => write!(f, "FAIL"),
        }
    }
}

/// One synthesis attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-based attempt index
    pub attempt: u32,
    pub variant: FallbackStrategy,
    pub verdict: Verdict,
    /// Combined output of the validation run
    pub diagnostic: String,
    /// Hash of the routine text the oracle validated
    pub routine_hash: ContentHash,
    pub started_at: DateTime<Utc>,
}

/// Outcome of a converged synthesis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisReport {
    pub run_id: Ulid,
    pub target: TargetId,
    pub schema: Schema,
    pub routine_path: PathBuf,
    pub oracle_path: PathBuf,
    pub attempts: Vec<AttemptRecord>,
}

impl SynthesisReport {
    /// Whether the last attempt passed
    #[must_use]
    pub fn converged(&self) -> bool {
        self.attempts.last().is_some_and(|a| a.verdict.is_pass())
    }

    /// The passing attempt, if any
    #[must_use]
    pub fn passing_attempt(&self) -> Option<&AttemptRecord> {
        self.attempts.iter().find(|a| a.verdict.is_pass())
    }
}

/// What the workspace currently holds for a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetStatus {
    pub target: TargetId,
    pub assets: Option<Assets>,
    pub routine_path: PathBuf,
    pub routine_hash: Option<ContentHash>,
    pub oracle_path: PathBuf,
    pub oracle_present: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_from_exit_status() {
        assert_eq!(Verdict::from_exit_status(0), Verdict::Pass);
        assert_eq!(Verdict::from_exit_status(1), Verdict::Fail);
        assert_eq!(Verdict::from_exit_status(-1), Verdict::Fail);
        assert_eq!(Verdict::Pass.to_string(), "PASS");
    }

    #[test]
    fn report_convergence_follows_last_attempt() {
        let record = |attempt, verdict| AttemptRecord {
            attempt,
            variant: FallbackStrategy::Classic,
            verdict,
            diagnostic: String::new(),
            routine_hash: ContentHash::compute(b"routine"),
            started_at: Utc::now(),
        };
        let mut report = SynthesisReport {
            run_id: Ulid::new(),
            target: TargetId::new("icici").unwrap(),
            schema: Schema::new(["Date"]).unwrap(),
            routine_path: PathBuf::from("custom_parsers/icici_parser.toml"),
            oracle_path: PathBuf::from("oracles/test_icici.toml"),
            attempts: vec![record(1, Verdict::Fail)],
        };
        assert!(!report.converged());
        assert!(report.passing_attempt().is_none());

        report.attempts.push(record(2, Verdict::Pass));
        assert!(report.converged());
        assert_eq!(report.passing_attempt().map(|a| a.attempt), Some(2));
    }
}
