//! CSV reading and writing
//!
//! Reference tables are plain CSV with a header row. Rows may be ragged;
//! absent trailing cells are treated as missing values.

use crate::error::TableError;
use crate::schema::Schema;
use crate::table::Table;
use std::io::Write;
use std::path::Path;

/// Read a CSV file into a [`Table`]
///
/// # Errors
/// - `TableError::Csv` if the file cannot be opened or a record is malformed
/// - `TableError::MissingHeader` if the file has no header row
pub fn read_table(path: impl AsRef<Path>) -> Result<Table, TableError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| TableError::csv(path, e))?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| TableError::csv(path, e))?
        .iter()
        .map(str::to_string)
        .collect();
    if columns.is_empty() {
        return Err(TableError::MissingHeader(path.to_path_buf()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| TableError::csv(path, e))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::new(columns, rows))
}

/// Read only the header of a CSV file as a [`Schema`]
///
/// # Errors
/// Same as [`read_table`], plus schema validation errors for empty or
/// duplicate column names.
pub fn read_schema(path: impl AsRef<Path>) -> Result<Schema, TableError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| TableError::csv(path, e))?;
    let headers = reader.headers().map_err(|e| TableError::csv(path, e))?;
    if headers.is_empty() {
        return Err(TableError::MissingHeader(path.to_path_buf()));
    }
    Schema::new(headers.iter())
}

/// Write a table as CSV (header first)
///
/// # Errors
/// Returns error on encoding or IO failure
pub fn write_table<W: Write>(table: &Table, writer: W) -> Result<(), TableError> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    wtr.write_record(table.columns())?;
    for row in table.rows() {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render a table as a CSV string
///
/// # Errors
/// Returns error on encoding failure
pub fn to_csv_string(table: &Table) -> Result<String, TableError> {
    let mut buf = Vec::new();
    write_table(table, &mut buf)?;
    String::from_utf8(buf).map_err(|_| TableError::Encoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write as _;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn read_table_with_ragged_rows() {
        let file = write_temp("Date,Description,Amount\n01/01/2024,Salary,100.00\n02/01/2024,ATM\n");
        let table = read_table(file.path()).unwrap();

        assert_eq!(table.columns(), ["Date", "Description", "Amount"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1], vec!["02/01/2024".to_string(), "ATM".to_string()]);
    }

    #[test]
    fn read_schema_from_header() {
        let file = write_temp("Date,Description,Debit Amt,Credit Amt,Balance\n");
        let schema = read_schema(file.path()).unwrap();
        assert_eq!(schema.len(), 5);
        assert_eq!(schema.column(2), Some("Debit Amt"));
    }

    #[test]
    fn read_schema_rejects_duplicate_headers() {
        let file = write_temp("A,A\n1,2\n");
        assert!(matches!(
            read_schema(file.path()),
            Err(TableError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn missing_file_is_csv_error() {
        let result = read_table("/nonexistent/reference.csv");
        assert!(matches!(result, Err(TableError::Csv { .. })));
    }

    #[test]
    fn csv_string_quotes_fields() {
        let table = Table::new(
            vec!["Description".into(), "Amount".into()],
            vec![vec!["NEFT, rent".into(), "1200".into()]],
        );
        let text = to_csv_string(&table).unwrap();
        assert_eq!(text, "Description,Amount\n\"NEFT, rent\",1200\n");
    }
}
