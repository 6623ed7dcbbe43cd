//! Normalized table comparison
//!
//! Both sides of a comparison are reduced to the reference's column set with
//! every cell in canonical text form:
//! - missing values and absent cells become `""`
//! - leading/trailing whitespace is trimmed
//! - internal whitespace runs collapse to a single space

use crate::table::Table;
use std::fmt::{self, Display, Formatter};

/// Canonical text form of one cell
#[must_use]
pub fn normalize_cell(raw: Option<&str>) -> String {
    match raw {
        Some(text) => text.split_whitespace().collect::<Vec<_>>().join(" "),
        None => String::new(),
    }
}

/// A table whose cells are canonical and whose header is fixed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl NormalizedTable {
    /// Normalize `table` against `columns` (reorder, pad, drop, canonicalize)
    #[must_use]
    pub fn new(table: &Table, columns: &[String]) -> Self {
        let reindexed = table.reindex(columns);
        let rows = reindexed
            .rows()
            .iter()
            .map(|row| row.iter().map(|c| normalize_cell(Some(c))).collect())
            .collect();
        Self {
            columns: columns.to_vec(),
            rows,
        }
    }

    /// Header columns
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Canonical rows
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

/// First difference found between a produced table and its reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// Different number of data rows
    RowCount { expected: usize, actual: usize },

    /// A cell differs after normalization
    Cell {
        row: usize,
        column: String,
        expected: String,
        actual: String,
    },
}

impl Display for Mismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::RowCount { expected, actual } => write!(
                f,
                "row count mismatch: expected {expected} rows, parsed {actual}"
            ),
            Mismatch::Cell {
                row,
                column,
                expected,
                actual,
            } => write!(
                f,
                "cell mismatch at row {row}, column '{column}': expected {expected:?}, parsed {actual:?}"
            ),
        }
    }
}

/// Compare `produced` to `reference` after normalizing both to the
/// reference's columns
///
/// # Errors
/// Returns the first [`Mismatch`] (row count first, then cells in row-major
/// order).
pub fn compare(produced: &Table, reference: &Table) -> Result<(), Mismatch> {
    let columns = reference.columns();
    let expected = NormalizedTable::new(reference, columns);
    let actual = NormalizedTable::new(produced, columns);

    if expected.rows.len() != actual.rows.len() {
        return Err(Mismatch::RowCount {
            expected: expected.rows.len(),
            actual: actual.rows.len(),
        });
    }

    for (row, (want, got)) in expected.rows.iter().zip(&actual.rows).enumerate() {
        for (col, (w, g)) in want.iter().zip(got).enumerate() {
            if w != g {
                return Err(Mismatch::Cell {
                    row,
                    column: columns[col].clone(),
                    expected: w.clone(),
                    actual: g.clone(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn cell_normalization() {
        assert_eq!(normalize_cell(Some(" 100.00 ")), "100.00");
        assert_eq!(normalize_cell(Some("UPI   to\tshop")), "UPI to shop");
        assert_eq!(normalize_cell(None), "");
    }

    #[test]
    fn whitespace_variation_compares_equal() {
        let reference = Table::new(strings(&["Amount"]), vec![strings(&[" 100.00 "])]);
        let produced = Table::new(strings(&["Amount"]), vec![strings(&["100.00"])]);
        assert_eq!(compare(&produced, &reference), Ok(()));
    }

    #[test]
    fn empty_and_absent_compare_equal() {
        let reference = Table::new(strings(&["Date", "Credit"]), vec![strings(&["01-01-2024", ""])]);
        let produced = Table::new(strings(&["Date"]), vec![strings(&["01-01-2024"])]);
        assert_eq!(compare(&produced, &reference), Ok(()));
    }

    #[test]
    fn row_count_mismatch_is_reported() {
        let reference = Table::new(strings(&["A"]), vec![strings(&["1"]), strings(&["2"])]);
        let produced = Table::new(strings(&["A"]), vec![strings(&["1"])]);
        let err = compare(&produced, &reference).unwrap_err();
        assert_eq!(err, Mismatch::RowCount { expected: 2, actual: 1 });
        assert!(err.to_string().contains("expected 2 rows"));
    }

    #[test]
    fn cell_mismatch_names_row_and_column() {
        let reference = Table::new(strings(&["A", "B"]), vec![strings(&["1", "x"])]);
        let produced = Table::new(strings(&["B", "A"]), vec![strings(&["y", "1"])]);
        let err = compare(&produced, &reference).unwrap_err();
        assert!(matches!(&err, Mismatch::Cell { row: 0, column, .. } if column == "B"));
    }

    #[test]
    fn extra_produced_columns_are_ignored() {
        let reference = Table::new(strings(&["A"]), vec![strings(&["1"])]);
        let produced = Table::new(strings(&["A", "Z"]), vec![strings(&["1", "junk"])]);
        assert_eq!(compare(&produced, &reference), Ok(()));
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(text in "[ \\ta-z0-9.,]{0,40}") {
            let once = normalize_cell(Some(&text));
            prop_assert_eq!(normalize_cell(Some(&once)), once);
        }

        #[test]
        fn padding_never_changes_verdict(text in "[a-z0-9.]{1,12}", pad in "[ \\t]{0,4}") {
            let reference = Table::new(vec!["A".into()], vec![vec![text.clone()]]);
            let produced = Table::new(vec!["A".into()], vec![vec![format!("{pad}{text}{pad}")]]);
            prop_assert_eq!(compare(&produced, &reference), Ok(()));
        }
    }
}
