use crate::db::repository;
use crate::error::LedgerResult;
use crate::models::Money;
use rusqlite::Connection;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSummary {
    pub db_path: String,
    pub entry_count: usize,
    pub remaining_total: Money,
    pub checked_total: Money,
}

impl fmt::Display for LedgerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Database: {}", self.db_path)?;
        writeln!(f, "Transactions: {}", self.entry_count)?;
        writeln!(f, "Remaining total: {}", self.remaining_total)?;
        write!(f, "Checked total: {}", self.checked_total)
    }
}

pub fn summarize(conn: &Connection) -> LedgerResult<LedgerSummary> {
    Ok(LedgerSummary {
        db_path: conn
            .path()
            .filter(|p| !p.is_empty())
            .unwrap_or(":memory:")
            .to_string(),
        entry_count: repository::transaction_count(conn)?,
        remaining_total: repository::remaining_total(conn)?,
        checked_total: repository::checked_total(conn)?,
    })
}
