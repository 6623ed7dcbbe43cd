//! Tabular values produced by routines and read from reference files

use crate::schema::Schema;

/// A header plus rows of text cells
///
/// Rows may be ragged: a row shorter than the header has absent trailing
/// cells. [`Table::conform`] reduces any table to an exact schema.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table from a header and rows
    #[inline]
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Empty table whose header is exactly `schema`
    #[inline]
    #[must_use]
    pub fn empty(schema: &Schema) -> Self {
        Self {
            columns: schema.to_vec(),
            rows: Vec::new(),
        }
    }

    /// Build a schema-shaped table from rows whose cells are assigned to
    /// schema columns by position
    ///
    /// Cells beyond the schema width are dropped; short rows are padded with
    /// empty strings.
    #[must_use]
    pub fn from_positional(schema: &Schema, rows: Vec<Vec<String>>) -> Self {
        let width = schema.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self {
            columns: schema.to_vec(),
            rows,
        }
    }

    /// Header columns
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no data rows
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell by row index and column name; `None` when either is absent
    #[must_use]
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }

    /// Reorder to `columns`: missing columns and absent cells become empty,
    /// extra columns are dropped
    ///
    /// When the header names a column twice, the first occurrence wins.
    #[must_use]
    pub fn reindex(&self, columns: &[String]) -> Self {
        let sources: Vec<Option<usize>> = columns
            .iter()
            .map(|wanted| self.columns.iter().position(|c| c == wanted))
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                sources
                    .iter()
                    .map(|src| src.and_then(|i| row.get(i)).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Self {
            columns: columns.to_vec(),
            rows,
        }
    }

    /// Reduce to exactly `schema`'s columns, in order
    #[inline]
    #[must_use]
    pub fn conform(&self, schema: &Schema) -> Self {
        self.reindex(&schema.to_vec())
    }

    /// Whether the header equals `schema` and every row has its width
    #[must_use]
    pub fn conforms_to(&self, schema: &Schema) -> bool {
        self.columns.len() == schema.len()
            && self.columns.iter().zip(schema.columns()).all(|(a, b)| a == b)
            && self.rows.iter().all(|r| r.len() == schema.len())
    }
}
