use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "checkbook.db";

/// How strictly type names on entries and rules are checked against the
/// registry when they are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeCheck {
    /// Unknown names are rejected with `LedgerError::UnknownType`.
    #[default]
    Strict,
    /// Any name is stored; unknown names count as outflows in totals.
    Lenient,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerOptions {
    pub type_check: TypeCheck,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub options: LedgerOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            options: LedgerOptions::default(),
        }
    }
}
