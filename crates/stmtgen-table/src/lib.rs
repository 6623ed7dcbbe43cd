//! stmtgen tables
//!
//! Schemas, tables and the normalized comparison that decides whether a
//! generated routine reproduced its reference output.
//!
//! # Core Concepts
//!
//! - [`Schema`]: ordered, unique column names derived from a reference header
//! - [`Table`]: header plus text rows, reducible to any schema
//! - [`compare`]: whitespace- and missing-value-insensitive equality
//! - [`ContentHash`]: Blake3 fingerprint of generated artifacts
//!
//! # Example
//!
//! ```rust,ignore
//! use stmtgen_table::{compare, read_table};
//!
//! let reference = read_table("data/icici/result.csv")?;
//! let produced = routine.parse(sample.as_ref());
//! compare(&produced, &reference)?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod csv_io;
mod error;
mod hash;
mod normalize;
mod schema;
mod table;

pub use csv_io::{read_schema, read_table, to_csv_string, write_table};
pub use error::TableError;
pub use hash::{ContentHash, HashError};
pub use normalize::{compare, normalize_cell, Mismatch, NormalizedTable};
pub use schema::Schema;
pub use table::Table;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
