//! Testing utilities for stmtgen workspace
//!
//! Shared test helpers, fixtures, and doubles.

#![allow(missing_docs)]

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stmtgen_extract::{EngineKind, ExtractError, ExtractionEngine, Grid};
use stmtgen_synth::{
    RoutineRegistry, RunOutput, RunnerError, RunnerKind, SynthConfig, Synthesizer,
    ValidationRunner, Verdict, Workspace,
};
use stmtgen_table::Schema;
use tempfile::TempDir;

/// Reference columns of the sample statements
pub const STATEMENT_COLUMNS: [&str; 5] = ["Date", "Description", "Debit Amt", "Credit Amt", "Balance"];

/// Five transactions every fallback variant can read
pub const STATEMENT_ROWS: [(&str, &str, &str); 5] = [
    ("01-08-2024", "Salary Credit XYZ Pvt Ltd", "1935.30"),
    ("02-08-2024", "Cheque Deposit Branch", "1652.61"),
    ("03-08-2024", "Electricity Bill Payment", "2779.38"),
    ("04-08-2024", "NEFT Transfer To ABC", "1711.22"),
    ("05-08-2024", "IMPS UPI Payment Amazon", "3034.61"),
];

/// Same statement with a description too short for the classic variant
pub const SHORT_DESCRIPTION_ROWS: [(&str, &str, &str); 5] = [
    ("01-08-2024", "Salary Credit XYZ Pvt Ltd", "1935.30"),
    ("02-08-2024", "Cheque Deposit Branch", "1652.61"),
    ("03-08-2024", "Electricity Bill Payment", "2779.38"),
    ("04-08-2024", "NEFT Transfer To ABC", "1711.22"),
    ("05-08-2024", "ATM", "500.00"),
];

/// A document no variant extracts anything from
pub const EMPTY_STATEMENT: &str = "ICICI Bank Statement\nNo transactions this period\n";

pub fn statement_schema() -> Schema {
    Schema::new(STATEMENT_COLUMNS).unwrap()
}

/// Reference CSV: amount in `Debit Amt`, credit and balance blank
pub fn reference_csv(rows: &[(&str, &str, &str)]) -> String {
    let mut csv = STATEMENT_COLUMNS.join(",");
    csv.push('\n');
    for (date, desc, amount) in rows {
        csv.push_str(&format!("{date},{desc},{amount},,\n"));
    }
    csv
}

/// Text statement with one single-spaced line per transaction
pub fn statement_text(rows: &[(&str, &str, &str)]) -> String {
    let mut text = String::from("ICICI Bank Statement\nAccount No 000012345\n");
    for (date, desc, amount) in rows {
        text.push_str(&format!("{date} {desc} {amount}\n"));
    }
    text
}

/// Extraction engine serving canned pages
#[derive(Debug, Default, Clone)]
pub struct MemoryEngine {
    tables: Vec<Vec<Grid>>,
    text: Vec<String>,
    failing: bool,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose every call fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Add a page of table candidates
    pub fn with_table_page(mut self, tables: Vec<Grid>) -> Self {
        self.tables.push(tables);
        self
    }

    /// Add a page of raw text
    pub fn with_text_page(mut self, text: impl Into<String>) -> Self {
        self.text.push(text.into());
        self
    }
}

impl ExtractionEngine for MemoryEngine {
    fn page_tables(&self, path: &Path) -> Result<Vec<Vec<Grid>>, ExtractError> {
        if self.failing {
            return Err(ExtractError::Encoding(path.to_path_buf()));
        }
        Ok(self.tables.clone())
    }

    fn page_text(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        if self.failing {
            return Err(ExtractError::Encoding(path.to_path_buf()));
        }
        Ok(self.text.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Build a grid from string cells
pub fn grid(rows: &[&[&str]]) -> Grid {
    rows.iter()
        .map(|row| row.iter().map(|c| Some((*c).to_string())).collect())
        .collect()
}

/// One observed runner invocation
#[derive(Debug, Clone)]
pub struct RunnerCall {
    pub oracle: PathBuf,
    /// Routine file text at the moment the runner was invoked
    pub routine_text: Option<String>,
}

/// Runner returning scripted exit statuses
#[derive(Debug)]
pub struct ScriptedRunner {
    script: Mutex<VecDeque<i32>>,
    default_status: i32,
    faults: Mutex<u32>,
    observe: Option<PathBuf>,
    calls: Mutex<Vec<RunnerCall>>,
}

impl ScriptedRunner {
    /// Every run exits with `status`
    pub fn always(status: i32) -> Self {
        Self::sequence(Vec::new(), status)
    }

    /// Runs exit with `script` in order, then `default_status`
    pub fn sequence(script: Vec<i32>, default_status: i32) -> Self {
        Self {
            script: Mutex::new(script.into()),
            default_status,
            faults: Mutex::new(0),
            observe: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// The first `count` runs fail to start instead of returning a status
    pub fn with_faults(self, count: u32) -> Self {
        *self.faults.lock() = count;
        self
    }

    /// Snapshot `routine` on every run
    pub fn observing(mut self, routine: impl Into<PathBuf>) -> Self {
        self.observe = Some(routine.into());
        self
    }

    pub fn calls(&self) -> Vec<RunnerCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait::async_trait]
impl ValidationRunner for ScriptedRunner {
    async fn run(&self, oracle: &Path) -> Result<RunOutput, RunnerError> {
        let routine_text = self
            .observe
            .as_ref()
            .and_then(|path| std::fs::read_to_string(path).ok());
        self.calls.lock().push(RunnerCall {
            oracle: oracle.to_path_buf(),
            routine_text,
        });
        {
            let mut faults = self.faults.lock();
            if *faults > 0 {
                *faults -= 1;
                return Err(RunnerError::Spawn {
                    program: PathBuf::from("scripted"),
                    source: std::io::Error::other("transient"),
                });
            }
        }
        let status = self.script.lock().pop_front().unwrap_or(self.default_status);
        Ok(RunOutput {
            exit_status: status,
            stdout: format!("{} scripted", Verdict::from_exit_status(status)),
            stderr: String::new(),
        })
    }
}

/// Temporary workspace with in-process execution and no retry delay
#[derive(Debug)]
pub struct ScratchWorkspace {
    dir: TempDir,
    config: SynthConfig,
}

impl ScratchWorkspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = SynthConfig::default()
            .with_root(dir.path())
            .with_retry_delay_ms(0)
            .with_engine(EngineKind::PlainText)
            .with_runner(RunnerKind::InProcess);
        Self { dir, config }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Replace the configuration; the root stays pinned to the scratch dir
    pub fn with_config(mut self, config: SynthConfig) -> Self {
        self.config = config.with_root(self.dir.path());
        self
    }

    pub fn workspace(&self) -> Arc<Workspace> {
        Arc::new(Workspace::from_config(&self.config).unwrap())
    }

    /// Write a sample document and reference table for `target`
    pub fn add_target(&self, target: &str, document_name: &str, document: &str, reference: &str) -> PathBuf {
        let dir = self.dir.path().join(&self.config.data_dir).join(target);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(document_name), document).unwrap();
        std::fs::write(dir.join("result.csv"), reference).unwrap();
        dir
    }

    /// Statement target whose classic fallback reproduces the reference
    pub fn add_statement(&self, target: &str) -> PathBuf {
        self.add_target(
            target,
            "statement.txt",
            &statement_text(&STATEMENT_ROWS),
            &reference_csv(&STATEMENT_ROWS),
        )
    }

    /// Synthesizer using the configured runner
    pub fn synthesizer(&self) -> Synthesizer {
        Synthesizer::from_config(self.config.clone(), None).unwrap()
    }

    /// Synthesizer using `runner`
    pub fn synthesizer_with(&self, runner: Arc<dyn ValidationRunner>) -> Synthesizer {
        let workspace = self.workspace();
        workspace.ensure().unwrap();
        let engine = stmtgen_extract::build_engine(self.config.engine, self.config.pdftotext_bin.clone());
        let registry = Arc::new(RoutineRegistry::new(engine));
        Synthesizer::new(self.config.clone(), workspace, registry, runner)
    }
}

impl Default for ScratchWorkspace {
    fn default() -> Self {
        Self::new()
    }
}
