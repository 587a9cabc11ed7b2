use thiserror::Error;

/// Failure to open or prepare the store. Nothing else may run after one.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to open database '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("Failed to create table '{table}': {source}")]
    CreateTable {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },
    #[error("Failed to add column '{column}' to '{table}': {source}")]
    Migrate {
        table: &'static str,
        column: &'static str,
        #[source]
        source: rusqlite::Error,
    },
    #[error("Failed to seed default types: {0}")]
    Seed(#[source] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("Transaction with ID {0} not found")]
    EntryNotFound(i64),
    #[error("Recurring rule with ID {0} not found")]
    RuleNotFound(i64),
    #[error("Type '{0}' already exists")]
    DuplicateType(String),
    #[error("Type '{0}' not found")]
    TypeNotFound(String),
    #[error("Type '{name}' is still used by {entries} transaction(s) and {rules} recurring rule(s)")]
    TypeInUse {
        name: String,
        entries: usize,
        rules: usize,
    },
    #[error("Unknown type '{0}'")]
    UnknownType(String),
    #[error("Type name cannot be empty")]
    EmptyTypeName,
    #[error("Invalid amount '{0}'. Please provide a valid decimal number.")]
    InvalidAmount(String),
    #[error("Invalid date '{0}'")]
    InvalidDate(String),
    #[error("Invalid day of month {0}. Must be between 1 and 31.")]
    InvalidAnchor(u32),
    #[error("Invalid transaction ID '{0}'")]
    InvalidId(String),
    #[error("Label too long ({0} bytes, max 255)")]
    LabelTooLong(usize),
    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
