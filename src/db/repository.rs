use crate::error::{LedgerError, LedgerResult};
use crate::models::{LedgerEntry, Money};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_ENTRY: &str =
    "SELECT id, date, label, amount, checked, check_date, type_name FROM transactions";

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn optional_date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let text: Option<String> = row.get(idx)?;
    match text {
        Some(text) if !text.trim().is_empty() => NaiveDate::parse_from_str(&text, DATE_FORMAT)
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        _ => Ok(None),
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<LedgerEntry> {
    Ok(LedgerEntry::from_parts(
        row.get(0)?,
        date_column(row, 1)?,
        row.get(2)?,
        Money::from_cents(row.get(3)?),
        row.get(4)?,
        optional_date_column(row, 5)?,
        row.get(6)?,
    ))
}

pub(crate) fn corrupt(e: rusqlite::Error) -> LedgerError {
    if matches!(
        e,
        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..)
    ) {
        LedgerError::CorruptRow(e.to_string())
    } else {
        LedgerError::Db(e)
    }
}

/// Inserts the entry and returns the id assigned by the store. Any id already
/// set on `entry` is ignored.
pub fn add_entry(conn: &Connection, entry: &LedgerEntry) -> LedgerResult<i64> {
    conn.execute(
        "INSERT INTO transactions (date, label, amount, checked, check_date, type_name) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            format_date(entry.date),
            &entry.label,
            entry.amount.cents(),
            entry.is_checked(),
            entry.check_date().map(format_date),
            &entry.type_name,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Replaces every field of the stored entry with the same id.
pub fn update_entry(conn: &Connection, id: i64, entry: &LedgerEntry) -> LedgerResult<()> {
    let rows_affected = conn.execute(
        "UPDATE transactions SET date = ?1, label = ?2, amount = ?3, checked = ?4, check_date = ?5, type_name = ?6 WHERE id = ?7",
        rusqlite::params![
            format_date(entry.date),
            &entry.label,
            entry.amount.cents(),
            entry.is_checked(),
            entry.check_date().map(format_date),
            &entry.type_name,
            id,
        ],
    )?;
    if rows_affected == 0 {
        return Err(LedgerError::EntryNotFound(id));
    }
    Ok(())
}

pub fn remove_entry(conn: &Connection, id: i64) -> LedgerResult<()> {
    let rows_affected = conn.execute("DELETE FROM transactions WHERE id = ?1", [id])?;
    if rows_affected == 0 {
        return Err(LedgerError::EntryNotFound(id));
    }
    Ok(())
}

pub fn get_entry(conn: &Connection, id: i64) -> LedgerResult<LedgerEntry> {
    conn.query_row(&format!("{} WHERE id = ?1", SELECT_ENTRY), [id], entry_from_row)
        .optional()
        .map_err(corrupt)?
        .ok_or(LedgerError::EntryNotFound(id))
}

/// All entries, newest first.
pub fn get_all_entries(conn: &Connection) -> LedgerResult<Vec<LedgerEntry>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY date DESC, id DESC", SELECT_ENTRY))?;
    let entry_iter = stmt.query_map([], entry_from_row)?;

    let mut entries = Vec::new();
    for entry in entry_iter {
        entries.push(entry.map_err(corrupt)?);
    }
    Ok(entries)
}

/// Flips `checked` and sets or clears `check_date` in a single statement.
/// Returns the entry as stored afterwards.
pub fn toggle_checked(conn: &Connection, id: i64, today: NaiveDate) -> LedgerResult<LedgerEntry> {
    let rows_affected = conn.execute(
        "UPDATE transactions
         SET checked = CASE WHEN checked = 0 THEN 1 ELSE 0 END,
             check_date = CASE WHEN checked = 0 THEN ?2 ELSE NULL END
         WHERE id = ?1",
        rusqlite::params![id, format_date(today)],
    )?;
    if rows_affected == 0 {
        return Err(LedgerError::EntryNotFound(id));
    }
    get_entry(conn, id)
}

const SIGNED_AMOUNT: &str = "CASE WHEN COALESCE(t.is_outflow, 1) = 1 THEN -e.amount ELSE e.amount END";

/// Sum of signed amounts over every entry. Entries whose type is missing from
/// the registry count as outflows.
pub fn remaining_total(conn: &Connection) -> LedgerResult<Money> {
    let total: i64 = conn.query_row(
        &format!(
            "SELECT IFNULL(SUM({}), 0) FROM transactions e LEFT JOIN types t ON t.name = e.type_name",
            SIGNED_AMOUNT
        ),
        [],
        |row| row.get(0),
    )?;
    Ok(Money::from_cents(total))
}

/// Sum of signed amounts over checked entries only.
pub fn checked_total(conn: &Connection) -> LedgerResult<Money> {
    let total: i64 = conn.query_row(
        &format!(
            "SELECT IFNULL(SUM({}), 0) FROM transactions e LEFT JOIN types t ON t.name = e.type_name WHERE e.checked = 1",
            SIGNED_AMOUNT
        ),
        [],
        |row| row.get(0),
    )?;
    Ok(Money::from_cents(total))
}

pub fn transaction_count(conn: &Connection) -> LedgerResult<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
    Ok(count as usize)
}

pub fn count_entries_with_type(conn: &Connection, type_name: &str) -> LedgerResult<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE type_name = ?1",
        [type_name],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}
