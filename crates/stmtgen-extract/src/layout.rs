//! Table detection over layout-preserving text
//!
//! A line is split into fields on runs of two or more spaces. Consecutive
//! lines with at least two fields form a block, and every block of two or
//! more lines is a table candidate whose first line is its header.

use crate::engine::Grid;

/// Minimum fields for a line to count as a table row
const MIN_FIELDS: usize = 2;

/// Minimum rows (header included) for a block to be a candidate
const MIN_ROWS: usize = 2;

/// Split one layout line into fields
#[must_use]
pub fn split_fields(line: &str) -> Vec<String> {
    line.replace('\t', "    ")
        .split("  ")
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(str::to_string)
        .collect()
}

/// Detect table candidates on one page of layout text
#[must_use]
pub fn detect_tables(page: &str) -> Vec<Grid> {
    let mut tables = Vec::new();
    let mut block: Grid = Vec::new();

    for line in page.lines() {
        let fields = split_fields(line);
        if fields.len() >= MIN_FIELDS {
            block.push(fields.into_iter().map(Some).collect());
        } else {
            flush(&mut block, &mut tables);
        }
    }
    flush(&mut block, &mut tables);

    tables
}

fn flush(block: &mut Grid, tables: &mut Vec<Grid>) {
    if block.len() >= MIN_ROWS {
        tables.push(std::mem::take(block));
    } else {
        block.clear();
    }
}

/// Split a text dump into pages on form feed, dropping the empty tail that
/// `pdftotext` leaves after the last page
#[must_use]
pub fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split('\x0c').map(str::to_string).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}
