use crate::config::LedgerOptions;
use crate::db::repository;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{LedgerEntry, Money};
use crate::operations::add::parse_date;
use crate::operations::types::ensure_known_type;
use chrono::NaiveDate;
use rusqlite::Connection;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_SEPARATOR: u8 = b';';

/// Where each ledger field is found in an imported row.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    pub date_column: usize,
    pub label_column: usize,
    pub amount_column: usize,
    pub type_column: Option<usize>,
    /// Used when there is no type column or the row's cell is empty.
    pub default_type: String,
    /// Applied to every imported row.
    pub checked: bool,
}

#[derive(Debug, Error)]
pub enum RowRejection {
    #[error("missing {field} column (index {index})")]
    MissingColumn { field: &'static str, index: usize },
    #[error("unrecognised date '{0}'")]
    InvalidDate(String),
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
    #[error(transparent)]
    Store(#[from] LedgerError),
}

#[derive(Debug)]
pub struct RejectedRow {
    /// Zero-based position in the input rows.
    pub row: usize,
    pub reason: RowRejection,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub rejected: Vec<RejectedRow>,
}

impl ImportReport {
    /// True only when every row was imported.
    pub fn is_success(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn total_rows(&self) -> usize {
        self.imported + self.rejected.len()
    }
}

/// A parsed CSV file: the header row and the remaining data rows.
#[derive(Debug, Default)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Reads a delimited file. Rows may have differing widths. Cells are kept as
/// written; bytes that are not valid UTF-8 (Latin-1 bank exports) are
/// replaced rather than failing the file.
pub fn read_csv(path: &Path, separator: u8, has_headers: bool) -> Result<CsvTable, String> {
    let file = File::open(path).map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(separator)
        .trim(csv::Trim::None)
        .flexible(true)
        .has_headers(false)
        .from_reader(file);

    let mut table = CsvTable::default();
    for (line_index, result) in reader.byte_records().enumerate() {
        let record = result.map_err(|e| format!("CSV parse error on line {}: {}", line_index + 1, e))?;
        let cells: Vec<String> = record
            .iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect();
        if has_headers && line_index == 0 {
            table.headers = cells.iter().map(|header| header.trim().to_string()).collect();
        } else {
            table.rows.push(cells);
        }
    }
    Ok(table)
}

fn cell<'a>(row: &'a [String], index: usize, field: &'static str) -> Result<&'a str, RowRejection> {
    row.get(index)
        .map(String::as_str)
        .ok_or(RowRejection::MissingColumn { field, index })
}

/// Turns one row into an entry without touching the store.
pub fn parse_row(row: &[String], mapping: &FieldMapping, today: NaiveDate) -> Result<LedgerEntry, RowRejection> {
    let date_cell = cell(row, mapping.date_column, "date")?;
    let label = cell(row, mapping.label_column, "label")?;
    let amount_cell = cell(row, mapping.amount_column, "amount")?;

    let date = parse_date(date_cell).map_err(|_| RowRejection::InvalidDate(date_cell.to_string()))?;
    let amount = Money::parse_lenient(amount_cell)
        .map_err(|_| RowRejection::InvalidAmount(amount_cell.to_string()))?;

    let type_name = mapping
        .type_column
        .and_then(|index| row.get(index))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .unwrap_or(mapping.default_type.as_str());

    let entry = LedgerEntry::new(date, label.to_string(), amount, type_name.to_string());
    Ok(if mapping.checked { entry.checked_on(today) } else { entry })
}

/// Imports every row it can. Rejected rows are reported and skipped; the
/// accepted ones are committed together.
pub fn import_rows(
    conn: &Connection,
    rows: &[Vec<String>],
    mapping: &FieldMapping,
    options: &LedgerOptions,
    today: NaiveDate,
) -> LedgerResult<ImportReport> {
    let tx = conn.unchecked_transaction()?;
    let mut report = ImportReport::default();

    for (index, row) in rows.iter().enumerate() {
        let outcome = parse_row(row, mapping, today).and_then(|entry| {
            ensure_known_type(&tx, &entry.type_name, options)?;
            repository::add_entry(&tx, &entry)?;
            Ok(())
        });
        match outcome {
            Ok(()) => report.imported += 1,
            Err(reason) => {
                tracing::warn!(row = index, %reason, "import row rejected");
                report.rejected.push(RejectedRow { row: index, reason });
            }
        }
    }

    tx.commit()?;
    tracing::info!(
        imported = report.imported,
        rejected = report.rejected.len(),
        "csv import finished"
    );
    Ok(report)
}

pub fn import_csv_file(
    conn: &Connection,
    path: &Path,
    separator: u8,
    has_headers: bool,
    mapping: &FieldMapping,
    options: &LedgerOptions,
    today: NaiveDate,
) -> Result<ImportReport, String> {
    let table = read_csv(path, separator, has_headers)?;
    import_rows(conn, &table.rows, mapping, options, today).map_err(|e| e.to_string())
}
