//! Ordered output column sets
//!
//! A [`Schema`] is derived once from a reference table's header and then held
//! fixed for every attempt of a synthesis run.

use crate::error::TableError;
use indexmap::IndexSet;
use std::fmt::{self, Display, Formatter};

/// Ordered, non-empty sequence of unique column names
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Schema(IndexSet<String>);

impl Schema {
    /// Build a schema from column names, preserving their order
    ///
    /// # Errors
    /// - `TableError::EmptySchema` if no columns are given
    /// - `TableError::DuplicateColumn` if a name repeats
    pub fn new<I, S>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = IndexSet::new();
        for column in columns {
            let column = column.into();
            if !set.insert(column.clone()) {
                return Err(TableError::DuplicateColumn(column));
            }
        }
        if set.is_empty() {
            return Err(TableError::EmptySchema);
        }
        Ok(Self(set))
    }

    /// Column names in order
    #[inline]
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Column names as an owned vector
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    /// Number of columns (never zero)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Position of a column by exact name
    #[inline]
    #[must_use]
    pub fn position(&self, column: &str) -> Option<usize> {
        self.0.get_index_of(column)
    }

    /// Column name at a position
    #[inline]
    #[must_use]
    pub fn column(&self, index: usize) -> Option<&str> {
        self.0.get_index(index).map(String::as_str)
    }
}

impl TryFrom<Vec<String>> for Schema {
    type Error = TableError;

    fn try_from(columns: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(columns)
    }
}

impl From<Schema> for Vec<String> {
    fn from(schema: Schema) -> Self {
        schema.0.into_iter().collect()
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, column) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{column}")?;
        }
        write!(f, "]")
    }
}
