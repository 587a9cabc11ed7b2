use crate::db::repository;
use crate::error::{LedgerError, LedgerResult};
use rusqlite::Connection;

/// Parses a user supplied id and deletes that entry.
pub fn remove_entry_from_db(conn: &Connection, id_input: &str) -> LedgerResult<i64> {
    let id_input = id_input.trim();
    let id = id_input
        .parse::<i64>()
        .map_err(|_| LedgerError::InvalidId(id_input.to_string()))?;
    repository::remove_entry(conn, id)?;
    tracing::debug!(id, "entry removed");
    Ok(id)
}
