//! stmtgen extraction engines
//!
//! The document-reading capability consumed by generated routines:
//! - [`ExtractionEngine`]: per-page table candidates and per-page raw text
//! - [`PdftotextEngine`]: poppler's `pdftotext` as a subprocess
//! - [`PlainTextEngine`]: text documents, pages split on form feed
//! - [`AutoEngine`]: picks one of the above by file extension

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod engine;
mod error;
pub mod layout;
mod pdftotext;
mod plain_text;

pub use engine::{build_engine, AutoEngine, EngineKind, ExtractionEngine, Grid};
pub use error::ExtractError;
pub use pdftotext::PdftotextEngine;
pub use plain_text::PlainTextEngine;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
