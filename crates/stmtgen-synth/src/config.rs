//! Synthesis configuration
//!
//! Layered in increasing precedence: defaults, a TOML file, `STMTGEN_*`
//! environment variables, then whatever the caller sets through the
//! `with_*` builders (the CLI maps its flags onto those).

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use stmtgen_extract::EngineKind;

/// Default retry budget
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default pause between attempts
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Environment variable overriding [`SynthConfig::root`]
pub const ENV_ROOT: &str = "STMTGEN_ROOT";
/// Environment variable overriding [`SynthConfig::max_attempts`]
pub const ENV_MAX_ATTEMPTS: &str = "STMTGEN_MAX_ATTEMPTS";
/// Environment variable overriding [`SynthConfig::retry_delay_ms`]
pub const ENV_RETRY_DELAY_MS: &str = "STMTGEN_RETRY_DELAY_MS";

/// How oracles are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunnerKind {
    /// Re-invoke the current executable's `oracle` subcommand; only the
    /// `stmtgen` binary itself can serve as that executable
    Subprocess,
    /// Execute on a blocking worker thread of this process
    #[default]
    InProcess,
}

impl std::str::FromStr for RunnerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subprocess" => Ok(Self::Subprocess),
            "in-process" => Ok(Self::InProcess),
            other => Err(format!("unknown runner: {other}")),
        }
    }
}

/// Synthesis configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Workspace root; the three directories below are relative to it
    pub root: PathBuf,
    /// Sample assets, one subdirectory per target
    pub data_dir: PathBuf,
    /// Persisted routines
    pub routines_dir: PathBuf,
    /// Persisted oracles
    pub oracles_dir: PathBuf,
    /// Retry budget per synthesis run
    pub max_attempts: u32,
    /// Pause between failed attempts
    pub retry_delay_ms: u64,
    /// Sample document extensions, tried in order
    pub document_extensions: Vec<String>,
    /// Reference table extension
    pub reference_extension: String,
    /// Extraction engine used by routines
    pub engine: EngineKind,
    /// `pdftotext` binary name or path
    pub pdftotext_bin: PathBuf,
    /// Oracle execution strategy; unset means [`RunnerKind::default`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner: Option<RunnerKind>,
}

impl SynthConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file; absent keys keep defaults
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Apply `STMTGEN_*` overrides from the process environment
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidOverride` on a non-numeric budget or delay
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `STMTGEN_*` overrides from an arbitrary lookup
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidOverride` on a non-numeric budget or delay
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ENV_ROOT) {
            self.root = PathBuf::from(root);
        }
        if let Some(value) = lookup(ENV_MAX_ATTEMPTS) {
            self.max_attempts = parse_override(ENV_MAX_ATTEMPTS, &value)?;
        }
        if let Some(value) = lookup(ENV_RETRY_DELAY_MS) {
            self.retry_delay_ms = parse_override(ENV_RETRY_DELAY_MS, &value)?;
        }
        Ok(self)
    }

    /// Reject configurations no run could succeed with
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` describing the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".to_string()));
        }
        if self.document_extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "document_extensions must name at least one extension".to_string(),
            ));
        }
        if self.reference_extension.trim().is_empty() {
            return Err(ConfigError::Invalid("reference_extension must not be empty".to_string()));
        }
        Ok(())
    }

    /// Pause after a failed attempt
    ///
    /// Only taken when another attempt follows; the last failure returns
    /// immediately.
    #[inline]
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// With workspace root
    #[inline]
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// With retry budget
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// With pause between attempts
    #[inline]
    #[must_use]
    pub fn with_retry_delay_ms(mut self, delay_ms: u64) -> Self {
        self.retry_delay_ms = delay_ms;
        self
    }

    /// With extraction engine
    #[inline]
    #[must_use]
    pub fn with_engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    /// With `pdftotext` binary
    #[inline]
    #[must_use]
    pub fn with_pdftotext_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.pdftotext_bin = bin.into();
        self
    }

    /// With oracle runner
    #[inline]
    #[must_use]
    pub fn with_runner(mut self, runner: RunnerKind) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Runner to build, falling back to [`RunnerKind::default`]
    #[inline]
    #[must_use]
    pub fn runner_kind(&self) -> RunnerKind {
        self.runner.unwrap_or_default()
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            data_dir: PathBuf::from("data"),
            routines_dir: PathBuf::from("custom_parsers"),
            oracles_dir: PathBuf::from("oracles"),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            document_extensions: vec!["pdf".to_string(), "txt".to_string()],
            reference_extension: "csv".to_string(),
            engine: EngineKind::Auto,
            pdftotext_bin: PathBuf::from("pdftotext"),
            runner: None,
        }
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_conventional_layout() {
        let config = SynthConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_delay(), Duration::from_secs(1));
        assert_eq!(config.routines_dir, PathBuf::from("custom_parsers"));
        assert_eq!(config.runner, None);
        assert_eq!(config.runner_kind(), RunnerKind::InProcess);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: SynthConfig = toml::from_str(
            r#"
            max_attempts = 5
            engine = "plain-text"
            runner = "in-process"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.engine, EngineKind::PlainText);
        assert_eq!(config.runner, Some(RunnerKind::InProcess));
        assert_eq!(config.reference_extension, "csv");
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stmtgen.toml");
        std::fs::write(&path, "retry_delay_ms = 0\n").unwrap();
        let config = SynthConfig::load(&path).unwrap();
        assert_eq!(config.retry_delay_ms, 0);

        let missing = SynthConfig::load(dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn overrides_take_precedence() {
        let env: HashMap<&str, &str> = [(ENV_ROOT, "/srv/stmtgen"), (ENV_MAX_ATTEMPTS, "7")].into();
        let config = SynthConfig::default()
            .apply_overrides(|k| env.get(k).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/stmtgen"));
        assert_eq!(config.max_attempts, 7);
        assert_eq!(config.retry_delay_ms, DEFAULT_RETRY_DELAY_MS);
    }

    #[test]
    fn bad_override_is_rejected() {
        let result = SynthConfig::default().apply_overrides(|k| {
            (k == ENV_RETRY_DELAY_MS).then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidOverride { key, .. }) if key == ENV_RETRY_DELAY_MS));
    }

    #[test]
    fn validate_rejects_zero_budget() {
        let config = SynthConfig::default().with_max_attempts(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SynthConfig::default();
        config.document_extensions.clear();
        assert!(config.validate().is_err());
    }
}
