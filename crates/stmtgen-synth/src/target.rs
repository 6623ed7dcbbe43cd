//! Target identifiers
//!
//! A target names a statement layout (usually a bank). Every path the
//! workspace derives for it is keyed by the case-folded identifier.

use crate::error::SynthError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Suffix appended to a target to name its routine
pub const ROUTINE_SUFFIX: &str = "_parser";

/// Prefix prepended to a target to name its oracle
pub const ORACLE_PREFIX: &str = "test_";

/// Case-folded statement-layout identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetId(String);

impl TargetId {
    /// Parse and case-fold a raw identifier
    ///
    /// # Errors
    /// Returns `SynthError::InvalidTarget` if the trimmed identifier is empty
    /// or contains anything but ASCII letters, digits, `_` and `-`.
    pub fn new(raw: &str) -> Result<Self, SynthError> {
        let folded = raw.trim().to_lowercase();
        let valid = !folded.is_empty()
            && folded
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
        if valid {
            Ok(Self(folded))
        } else {
            Err(SynthError::InvalidTarget(raw.to_string()))
        }
    }

    /// Case-folded identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name under which the routine is persisted and resolved
    #[must_use]
    pub fn routine_name(&self) -> String {
        format!("{}{ROUTINE_SUFFIX}", self.0)
    }

    /// Name under which the oracle is persisted
    #[must_use]
    pub fn oracle_name(&self) -> String {
        format!("{ORACLE_PREFIX}{}", self.0)
    }
}

impl Display for TargetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TargetId {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TargetId {
    type Error = SynthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<TargetId> for String {
    fn from(target: TargetId) -> Self {
        target.0
    }
}
