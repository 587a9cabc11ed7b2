//! Personal checkbook ledger: a SQLite-backed store of dated money movements,
//! classified by type, reconciled against bank statements and fed by
//! recurring rules and CSV imports.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod operations;

use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Once;

pub use config::{Config, LedgerOptions, TypeCheck};
pub use error::{LedgerError, LedgerResult, SchemaError};
pub use models::{Cadence, Classification, LedgerEntry, Money, RecurringRule, TypeRecord};
pub use operations::import::{FieldMapping, ImportReport, RowRejection};
pub use operations::reconcile::{Reconciliation, ReconciliationStatus};
pub use operations::recurring::PostingSummary;
pub use operations::summary::LedgerSummary;

use db::{connection, repository, rule_repository};
use operations::{add, import, recurring, reconcile, summary, types};

static INIT_TRACING: Once = Once::new();

/// Installs the fmt subscriber, filtered by `RUST_LOG` (default
/// `checkbook=info`). Later calls do nothing.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("checkbook=info"));
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    });
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// An open ledger. Owns the store connection for its whole lifetime; the
/// schema is initialized before the value is handed out.
pub struct Ledger {
    conn: Connection,
    options: LedgerOptions,
}

impl Ledger {
    pub fn open(config: &Config) -> Result<Self, SchemaError> {
        Self::open_path(&config.db_path, config.options)
    }

    pub fn open_path(path: &Path, options: LedgerOptions) -> Result<Self, SchemaError> {
        let conn = connection::establish_connection(path)?;
        Ok(Self { conn, options })
    }

    pub fn open_in_memory(options: LedgerOptions) -> Result<Self, SchemaError> {
        let conn = connection::establish_in_memory_connection()?;
        Ok(Self { conn, options })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn options(&self) -> &LedgerOptions {
        &self.options
    }

    pub fn add_type(&self, name: &str, classification: Classification) -> LedgerResult<()> {
        types::add_type_db(&self.conn, name, classification)
    }

    pub fn update_type(&self, name: &str, classification: Classification) -> LedgerResult<()> {
        types::update_type_db(&self.conn, name, classification)
    }

    pub fn remove_type(&self, name: &str) -> LedgerResult<()> {
        types::remove_type_db(&self.conn, name)
    }

    pub fn list_types(&self) -> LedgerResult<Vec<TypeRecord>> {
        types::list_types_db(&self.conn)
    }

    /// Unknown names classify as `Outflow`.
    pub fn classification_of(&self, name: &str) -> LedgerResult<Classification> {
        types::classification_of(&self.conn, name)
    }

    pub fn create_entry(&self, entry: &LedgerEntry) -> LedgerResult<i64> {
        add::add_entry_to_db(&self.conn, entry, &self.options)
    }

    pub fn update_entry(&self, id: i64, entry: &LedgerEntry) -> LedgerResult<()> {
        add::update_entry_in_db(&self.conn, id, entry, &self.options)
    }

    pub fn delete_entry(&self, id: i64) -> LedgerResult<()> {
        repository::remove_entry(&self.conn, id)
    }

    pub fn entry(&self, id: i64) -> LedgerResult<LedgerEntry> {
        repository::get_entry(&self.conn, id)
    }

    /// All entries, newest first.
    pub fn entries(&self) -> LedgerResult<Vec<LedgerEntry>> {
        repository::get_all_entries(&self.conn)
    }

    pub fn toggle_checked(&self, id: i64, today: NaiveDate) -> LedgerResult<LedgerEntry> {
        repository::toggle_checked(&self.conn, id, today)
    }

    pub fn remaining_total(&self) -> LedgerResult<Money> {
        repository::remaining_total(&self.conn)
    }

    pub fn checked_total(&self) -> LedgerResult<Money> {
        repository::checked_total(&self.conn)
    }

    pub fn difference(&self, bank_balance: Money) -> LedgerResult<Money> {
        Ok(reconcile::difference(
            self.checked_total()?,
            self.remaining_total()?,
            bank_balance,
        ))
    }

    pub fn create_rule(&self, rule: &RecurringRule) -> LedgerResult<i64> {
        recurring::create_rule_db(&self.conn, rule, &self.options)
    }

    pub fn update_rule(&self, id: i64, rule: &RecurringRule) -> LedgerResult<()> {
        recurring::update_rule_db(&self.conn, id, rule, &self.options)
    }

    pub fn delete_rule(&self, id: i64) -> LedgerResult<()> {
        rule_repository::remove_rule(&self.conn, id)
    }

    pub fn rule(&self, id: i64) -> LedgerResult<RecurringRule> {
        rule_repository::get_rule(&self.conn, id)
    }

    pub fn rules(&self) -> LedgerResult<Vec<RecurringRule>> {
        rule_repository::get_all_rules(&self.conn)
    }

    pub fn run_due_postings(&self, today: NaiveDate) -> LedgerResult<PostingSummary> {
        recurring::run_due_postings(&self.conn, today, &self.options)
    }

    pub fn import_rows(&self, rows: &[Vec<String>], mapping: &FieldMapping, today: NaiveDate) -> LedgerResult<ImportReport> {
        import::import_rows(&self.conn, rows, mapping, &self.options, today)
    }

    pub fn summary(&self) -> LedgerResult<LedgerSummary> {
        summary::summarize(&self.conn)
    }
}
