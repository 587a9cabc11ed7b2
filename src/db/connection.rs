use rusqlite::Connection;
use std::path::Path;

use crate::db::schema;
use crate::error::SchemaError;

/// Opens the store at `path` and brings its schema up to date.
pub fn establish_connection(path: &Path) -> Result<Connection, SchemaError> {
    let conn = Connection::open(path).map_err(|source| SchemaError::Open {
        path: path.display().to_string(),
        source,
    })?;
    schema::initialize(&conn)?;
    tracing::info!(path = %path.display(), "ledger store opened");
    Ok(conn)
}

pub fn establish_in_memory_connection() -> Result<Connection, SchemaError> {
    let conn = Connection::open_in_memory().map_err(|source| SchemaError::Open {
        path: ":memory:".to_string(),
        source,
    })?;
    schema::initialize(&conn)?;
    Ok(conn)
}

#[cfg(test)]
pub fn establish_test_connection() -> Result<Connection, SchemaError> {
    establish_in_memory_connection()
}
