//! Fallback extraction strategies
//!
//! Each variant is a line-oriented pattern over the document's concatenated
//! page text. Every pattern captures `date`, `desc` and `amount`; matches
//! become rows assigned to schema columns by position. Attempt `k` of a run
//! always gets the same variant, and consecutive attempts get different
//! ones.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Capture groups every fallback pattern must define
pub const REQUIRED_GROUPS: [&str; 3] = ["date", "desc", "amount"];

/// `dd/mm/yy[yy]` or `dd-mm-yy[yy]`, single space separated, greedy
/// description of 5-100 characters, last numeric token
const CLASSIC: &str = r"(?m)(?P<date>\d{1,2}[/-]\d{1,2}[/-]\d{2,4})[ \t]+(?P<desc>.{5,100})[ \t]+(?P<amount>[-\d,.]+)";

/// Whole-line match ending in a two-decimal amount
const STRICT_DECIMAL: &str = r"(?m)^[ \t]*(?P<date>\d{1,2}[/-]\d{1,2}[/-]\d{2,4})[ \t]+(?P<desc>.{3,120}?)[ \t]+(?P<amount>-?[\d,]*\d\.\d{2})[ \t]*$";

/// Month-name dates allowed; the trailing run of numeric tokens is split
/// across the columns after the description
const TRAILING_AMOUNTS: &str = r"(?m)^[ \t]*(?P<date>\d{1,2}[/\- ](?:\d{1,2}|[A-Za-z]{3})[/\- ]\d{2,4})[ \t]+(?P<desc>.{1,160}?)(?P<amount>(?:[ \t]+-?[\d,]*\d(?:\.\d+)?)+)[ \t]*$";

/// Closed set of fallback variants, in rotation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackStrategy {
    Classic,
    StrictDecimal,
    TrailingAmounts,
}

impl FallbackStrategy {
    /// All variants in rotation order
    pub const ALL: [FallbackStrategy; 3] = [
        FallbackStrategy::Classic,
        FallbackStrategy::StrictDecimal,
        FallbackStrategy::TrailingAmounts,
    ];

    /// Regular expression source for this variant
    #[must_use]
    pub fn pattern(self) -> &'static str {
        match self {
            FallbackStrategy::Classic => CLASSIC,
            FallbackStrategy::StrictDecimal => STRICT_DECIMAL,
            FallbackStrategy::TrailingAmounts => TRAILING_AMOUNTS,
        }
    }

    /// Whether the `amount` capture holds several whitespace-separated cells
    #[must_use]
    pub fn splits_amounts(self) -> bool {
        matches!(self, FallbackStrategy::TrailingAmounts)
    }

    /// Rendered body for this variant
    #[must_use]
    pub fn body(self) -> FallbackBody {
        FallbackBody {
            variant: self,
            pattern: self.pattern().to_string(),
            split_amounts: self.splits_amounts(),
        }
    }
}

impl Display for FallbackStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            FallbackStrategy::Classic => "classic",
            FallbackStrategy::StrictDecimal => "strict-decimal",
            FallbackStrategy::TrailingAmounts => "trailing-amounts",
        };
        f.write_str(name)
    }
}

/// Fallback section of a routine manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackBody {
    pub variant: FallbackStrategy,
    pub pattern: String,
    pub split_amounts: bool,
}

/// Maps attempt indices to fallback bodies
#[derive(Debug, Clone)]
pub struct FallbackGenerator {
    rotation: Vec<FallbackStrategy>,
}

impl FallbackGenerator {
    /// Generator cycling through every variant
    #[must_use]
    pub fn new() -> Self {
        Self {
            rotation: FallbackStrategy::ALL.to_vec(),
        }
    }

    /// Variant for 1-based attempt `k`; `0` is treated as `1` and indices
    /// past the rotation wrap around
    #[must_use]
    pub fn variant_for(&self, attempt: u32) -> FallbackBody {
        let index = attempt.saturating_sub(1) as usize % self.rotation.len();
        self.rotation[index].body()
    }
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self::new()
    }
}
