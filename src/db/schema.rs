use rusqlite::Connection;

use crate::error::SchemaError;
use crate::models::Classification;

/// Types present after the first initialization. Inserted only when absent.
pub const DEFAULT_TYPES: [(&str, Classification); 3] = [
    ("CB", Classification::Outflow),
    ("CHEQUE", Classification::Outflow),
    ("VIREMENT", Classification::Inflow),
];

const CREATE_TRANSACTIONS: &str = "CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    label TEXT NOT NULL,
    amount INTEGER NOT NULL CHECK (amount >= 0),
    checked INTEGER NOT NULL DEFAULT 0,
    check_date TEXT,
    type_name TEXT NOT NULL
)";

const CREATE_TYPES: &str = "CREATE TABLE IF NOT EXISTS types (
    name TEXT PRIMARY KEY NOT NULL,
    is_outflow INTEGER NOT NULL DEFAULT 1
)";

const CREATE_RECURRING_RULES: &str = "CREATE TABLE IF NOT EXISTS recurring_rules (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    label TEXT NOT NULL,
    amount INTEGER NOT NULL CHECK (amount >= 0),
    type_name TEXT NOT NULL,
    cadence TEXT NOT NULL CHECK (cadence IN ('daily', 'weekly', 'monthly', 'yearly')),
    start_date TEXT NOT NULL,
    end_date TEXT,
    last_executed TEXT,
    day_of_month INTEGER NOT NULL DEFAULT 1,
    active INTEGER NOT NULL DEFAULT 1
)";

/// Columns introduced after the first schema revision.
const ADDED_COLUMNS: [(&str, &str, &str); 2] = [
    ("types", "is_outflow", "INTEGER NOT NULL DEFAULT 1"),
    ("transactions", "check_date", "TEXT"),
];

/// Creates missing tables, adds missing columns and seeds default types.
/// Safe to run on every startup.
pub fn initialize(conn: &Connection) -> Result<(), SchemaError> {
    for (table, sql) in [
        ("transactions", CREATE_TRANSACTIONS),
        ("types", CREATE_TYPES),
        ("recurring_rules", CREATE_RECURRING_RULES),
    ] {
        conn.execute(sql, [])
            .map_err(|source| SchemaError::CreateTable { table, source })?;
    }

    for (table, column, definition) in ADDED_COLUMNS {
        let present = has_column(conn, table, column)
            .map_err(|source| SchemaError::Migrate { table, column, source })?;
        if !present {
            conn.execute(
                &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, definition),
                [],
            )
            .map_err(|source| SchemaError::Migrate { table, column, source })?;
            tracing::info!(table, column, "schema migrated: column added");
        }
    }

    seed_default_types(conn).map_err(SchemaError::Seed)?;
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name?.eq_ignore_ascii_case(column) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn seed_default_types(conn: &Connection) -> rusqlite::Result<()> {
    for (name, classification) in DEFAULT_TYPES {
        conn.execute(
            "INSERT OR IGNORE INTO types (name, is_outflow) VALUES (?1, ?2)",
            rusqlite::params![name, classification.is_outflow()],
        )?;
    }
    Ok(())
}
