use crate::config::{LedgerOptions, TypeCheck};
use crate::db::{repository, rule_repository, type_repository};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Classification, TypeRecord};
use rusqlite::Connection;

pub fn add_type_db(conn: &Connection, name: &str, classification: Classification) -> LedgerResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::EmptyTypeName);
    }
    type_repository::add_type(conn, name, classification)?;
    tracing::info!(name, %classification, "type added");
    Ok(())
}

/// Reclassifies an existing type. Names cannot be changed.
pub fn update_type_db(conn: &Connection, name: &str, classification: Classification) -> LedgerResult<()> {
    type_repository::update_type(conn, name.trim(), classification)
}

/// Deletes a type that no entry or recurring rule refers to.
pub fn remove_type_db(conn: &Connection, name: &str) -> LedgerResult<()> {
    let name = name.trim();
    if type_repository::get_type(conn, name)?.is_none() {
        return Err(LedgerError::TypeNotFound(name.to_string()));
    }
    let entries = repository::count_entries_with_type(conn, name)?;
    let rules = rule_repository::count_rules_with_type(conn, name)?;
    if entries > 0 || rules > 0 {
        return Err(LedgerError::TypeInUse {
            name: name.to_string(),
            entries,
            rules,
        });
    }
    type_repository::delete_type(conn, name)?;
    tracing::info!(name, "type removed");
    Ok(())
}

pub fn list_types_db(conn: &Connection) -> LedgerResult<Vec<TypeRecord>> {
    type_repository::get_all_types(conn)
}

/// Classification of `name`, or `Outflow` when the name is not registered.
pub fn classification_of(conn: &Connection, name: &str) -> LedgerResult<Classification> {
    Ok(type_repository::get_type(conn, name)?
        .map(|t| t.classification)
        .unwrap_or_default())
}

/// Fails with `UnknownType` when strict checking is on and `name` is not
/// registered.
pub fn ensure_known_type(conn: &Connection, name: &str, options: &LedgerOptions) -> LedgerResult<()> {
    if options.type_check == TypeCheck::Lenient {
        return Ok(());
    }
    match type_repository::get_type(conn, name)? {
        Some(_) => Ok(()),
        None => Err(LedgerError::UnknownType(name.to_string())),
    }
}
