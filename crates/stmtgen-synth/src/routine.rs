//! Routine runtime
//!
//! [`TemplateRoutine`] executes a manifest against a document:
//! 1. Primary: the first table candidate (page order, then table order on the
//!    page) whose cleaned header mentions some schema column's first word.
//! 2. Fallback: the manifest's pattern over the concatenated page text.
//! 3. Otherwise an empty table shaped by the schema.
//!
//! Parsing is total. Extraction failures inside either strategy are logged
//! and treated as "strategy produced nothing".

use crate::error::RoutineError;
use crate::fallback::REQUIRED_GROUPS;
use crate::template::{RoutineManifest, RoutineSource};
use regex::Regex;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use stmtgen_extract::ExtractionEngine;
use stmtgen_table::{Schema, Table};

/// A document-to-table strategy resolvable by name
pub trait Routine: Send + Sync + Debug {
    /// Parse `input` into a table whose header is exactly [`Routine::schema`]
    fn parse(&self, input: &Path) -> Table;

    /// Output schema
    fn schema(&self) -> &Schema;

    /// Routine name
    fn name(&self) -> &str;
}

/// Routine compiled from a persisted manifest
#[derive(Debug)]
pub struct TemplateRoutine {
    manifest: RoutineManifest,
    pattern: Regex,
    engine: Arc<dyn ExtractionEngine>,
}

impl TemplateRoutine {
    /// Compile a manifest
    ///
    /// # Errors
    /// - `RoutineError::Pattern` if the fallback pattern does not compile
    /// - `RoutineError::MissingGroup` if it lacks `date`, `desc` or `amount`
    pub fn compile(
        manifest: RoutineManifest,
        engine: Arc<dyn ExtractionEngine>,
    ) -> Result<Self, RoutineError> {
        let variant = manifest.fallback.variant;
        let pattern = Regex::new(&manifest.fallback.pattern)
            .map_err(|e| RoutineError::Pattern { variant, source: e })?;

        let names: Vec<&str> = pattern.capture_names().flatten().collect();
        if let Some(group) = REQUIRED_GROUPS.into_iter().find(|g| !names.contains(g)) {
            return Err(RoutineError::MissingGroup { variant, group });
        }

        Ok(Self {
            manifest,
            pattern,
            engine,
        })
    }

    /// Parse and compile persisted routine text
    ///
    /// # Errors
    /// Returns `RoutineError` if the text is not a valid manifest or its
    /// pattern does not compile
    pub fn from_source(
        source: &RoutineSource,
        engine: Arc<dyn ExtractionEngine>,
    ) -> Result<Self, RoutineError> {
        Self::compile(source.manifest()?, engine)
    }

    #[inline]
    #[must_use]
    pub fn manifest(&self) -> &RoutineManifest {
        &self.manifest
    }

    fn primary(&self, input: &Path) -> Option<Table> {
        let pages = match self.engine.page_tables(input) {
            Ok(pages) => pages,
            Err(e) => {
                tracing::debug!(routine = %self.name(), error = %e, "table extraction failed");
                return None;
            }
        };

        let strip = &self.manifest.primary.strip_symbols;
        let schema = self.schema();
        for grid in pages.iter().flatten() {
            if grid.len() < self.manifest.primary.min_rows {
                continue;
            }
            let Some((head, body)) = grid.split_first() else {
                continue;
            };
            let header: Vec<String> = head
                .iter()
                .map(|cell| clean_cell(cell.as_deref(), strip))
                .collect();
            if !header_matches(&header, schema) {
                continue;
            }
            let rows = body
                .iter()
                .map(|row| row.iter().map(|cell| clean_cell(cell.as_deref(), strip)).collect())
                .collect();
            tracing::debug!(routine = %self.name(), header = ?header, "primary strategy matched");
            return Some(Table::new(header, rows).conform(schema));
        }
        None
    }

    fn fallback(&self, input: &Path) -> Option<Table> {
        let text = match self.engine.page_text(input) {
            Ok(pages) => pages.join("\n"),
            Err(e) => {
                tracing::debug!(routine = %self.name(), error = %e, "text extraction failed");
                return None;
            }
        };

        let split_amounts = self.manifest.fallback.split_amounts;
        let rows: Vec<Vec<String>> = self
            .pattern
            .captures_iter(&text)
            .map(|caps| {
                let field = |name| caps.name(name).map_or("", |m| m.as_str()).trim().to_string();
                let mut row = vec![field("date"), field("desc")];
                let amount = field("amount");
                if split_amounts {
                    row.extend(amount.split_whitespace().map(str::to_string));
                } else {
                    row.push(amount);
                }
                row
            })
            .collect();

        if rows.is_empty() {
            None
        } else {
            Some(Table::from_positional(self.schema(), rows))
        }
    }
}

impl Routine for TemplateRoutine {
    fn parse(&self, input: &Path) -> Table {
        self.primary(input)
            .or_else(|| self.fallback(input))
            .unwrap_or_else(|| Table::empty(self.schema()))
    }

    fn schema(&self) -> &Schema {
        &self.manifest.routine.columns
    }

    fn name(&self) -> &str {
        &self.manifest.routine.name
    }
}

/// Clean one extracted cell: absent becomes empty, `strip` characters are
/// removed and whitespace is collapsed
#[must_use]
pub fn clean_cell(raw: Option<&str>, strip: &str) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let stripped: String = raw.chars().filter(|c| !strip.contains(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True if any schema column's first word occurs in the lower-cased,
/// space-joined header
#[must_use]
pub fn header_matches(header: &[String], schema: &Schema) -> bool {
    let joined = header.join(" ").to_lowercase();
    schema.columns().any(|column| {
        column
            .to_lowercase()
            .split_whitespace()
            .next()
            .is_some_and(|word| joined.contains(word))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::{FallbackBody, FallbackStrategy};
    use crate::target::TargetId;
    use crate::template::RoutineTemplate;
    use pretty_assertions::assert_eq;
    use stmtgen_extract::{ExtractError, Grid};

    #[derive(Debug, Default)]
    struct StubEngine {
        tables: Vec<Vec<Grid>>,
        text: Vec<String>,
        broken: bool,
    }

    impl ExtractionEngine for StubEngine {
        fn page_tables(&self, path: &Path) -> Result<Vec<Vec<Grid>>, ExtractError> {
            if self.broken {
                return Err(ExtractError::Encoding(path.to_path_buf()));
            }
            Ok(self.tables.clone())
        }

        fn page_text(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
            if self.broken {
                return Err(ExtractError::Encoding(path.to_path_buf()));
            }
            Ok(self.text.clone())
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    fn schema() -> Schema {
        Schema::new(["Date", "Description", "Debit Amt", "Credit Amt", "Balance"]).unwrap()
    }

    fn routine(engine: StubEngine, fallback: &FallbackBody) -> TemplateRoutine {
        let source = RoutineTemplate::new(&TargetId::new("icici").unwrap())
            .instantiate(&schema(), fallback)
            .unwrap();
        TemplateRoutine::from_source(&source, Arc::new(engine)).unwrap()
    }

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|row| row.iter().map(|c| Some((*c).to_string())).collect())
            .collect()
    }

    #[test]
    fn clean_cell_strips_currency_and_whitespace() {
        assert_eq!(clean_cell(Some(" ₹1,000.00 "), "₹$,"), "1000.00");
        assert_eq!(clean_cell(Some("UPI\n to  shop"), ""), "UPI to shop");
        assert_eq!(clean_cell(None, "₹"), "");
    }

    #[test]
    fn header_match_uses_first_word() {
        let header = vec!["Txn Date".to_string(), "Narration".to_string()];
        assert!(header_matches(&header, &schema()));
        let header = vec!["Page".to_string(), "Total".to_string()];
        assert!(!header_matches(&header, &schema()));
    }

    #[test]
    fn primary_picks_first_matching_table() {
        let engine = StubEngine {
            tables: vec![
                vec![grid(&[&["Summary", "Value"], &["Opening", "10"]])],
                vec![grid(&[
                    &["Date", "Description", "Balance"],
                    &["01-08-2024", "Salary", "₹1,000.00"],
                ])],
            ],
            ..StubEngine::default()
        };
        let table = routine(engine, &FallbackStrategy::Classic.body()).parse(Path::new("s.pdf"));

        assert!(table.conforms_to(&schema()));
        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, "Balance"), Some("1000.00"));
        assert_eq!(table.cell(0, "Debit Amt"), Some(""));
    }

    #[test]
    fn fallback_assigns_positionally() {
        let engine = StubEngine {
            text: vec![
                "Statement\n01-08-2024 Salary Credit XYZ 1935.30".to_string(),
                "02-08-2024 Cheque Deposit 1652.61".to_string(),
            ],
            ..StubEngine::default()
        };
        let table = routine(engine, &FallbackStrategy::Classic.body()).parse(Path::new("s.pdf"));

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.rows()[1],
            vec!["02-08-2024", "Cheque Deposit", "1652.61", "", ""]
        );
    }

    #[test]
    fn trailing_amounts_fill_later_columns() {
        let engine = StubEngine {
            text: vec!["01 Aug 2024 Card purchase 250.00 0.00 9750.00".to_string()],
            ..StubEngine::default()
        };
        let table =
            routine(engine, &FallbackStrategy::TrailingAmounts.body()).parse(Path::new("s.pdf"));
        assert_eq!(
            table.rows()[0],
            vec!["01 Aug 2024", "Card purchase", "250.00", "0.00", "9750.00"]
        );
    }

    #[test]
    fn extraction_failure_yields_empty_table() {
        let engine = StubEngine {
            broken: true,
            ..StubEngine::default()
        };
        let table = routine(engine, &FallbackStrategy::Classic.body()).parse(Path::new("s.pdf"));
        assert!(table.is_empty());
        assert!(table.conforms_to(&schema()));
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let source = RoutineTemplate::new(&TargetId::new("icici").unwrap())
            .instantiate(
                &schema(),
                &FallbackBody {
                    variant: FallbackStrategy::Classic,
                    pattern: r"(?P<date>\d+) (?P<desc>.+)".to_string(),
                    split_amounts: false,
                },
            )
            .unwrap();
        let result = TemplateRoutine::from_source(&source, Arc::new(StubEngine::default()));
        assert!(matches!(
            result,
            Err(RoutineError::MissingGroup { group: "amount", .. })
        ));
    }
}
