use crate::config::LedgerOptions;
use crate::db::repository;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{LedgerEntry, Money};
use crate::operations::types::ensure_known_type;
use chrono::NaiveDate;
use rusqlite::Connection;

/// Date layouts accepted from users and bank exports, tried in order.
pub const ACCEPTED_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

const MAX_LABEL_LEN: usize = 255;

pub fn parse_date(input: &str) -> LedgerResult<NaiveDate> {
    let input = input.trim();
    ACCEPTED_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .ok_or_else(|| LedgerError::InvalidDate(input.to_string()))
}

/// Builds an unchecked entry from free-text fields.
pub fn create_entry(date: &str, label: &str, amount: &str, type_name: &str) -> LedgerResult<LedgerEntry> {
    let date = parse_date(date)?;
    let amount = Money::parse_lenient(amount)?;

    let label = label.trim().to_string();
    if label.len() > MAX_LABEL_LEN {
        return Err(LedgerError::LabelTooLong(label.len()));
    }

    let type_name = type_name.trim();
    if type_name.is_empty() {
        return Err(LedgerError::EmptyTypeName);
    }

    Ok(LedgerEntry::new(date, label, amount, type_name.to_string()))
}

pub fn add_entry_to_db(conn: &Connection, entry: &LedgerEntry, options: &LedgerOptions) -> LedgerResult<i64> {
    ensure_known_type(conn, &entry.type_name, options)?;
    let id = repository::add_entry(conn, entry)?;
    tracing::debug!(id, date = %entry.date, amount = %entry.amount, type_name = %entry.type_name, "entry added");
    Ok(id)
}

pub fn update_entry_in_db(
    conn: &Connection,
    id: i64,
    entry: &LedgerEntry,
    options: &LedgerOptions,
) -> LedgerResult<()> {
    ensure_known_type(conn, &entry.type_name, options)?;
    repository::update_entry(conn, id, entry)
}
