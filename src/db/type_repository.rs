use crate::error::{LedgerError, LedgerResult};
use crate::models::{Classification, TypeRecord};
use rusqlite::{Connection, ErrorCode, OptionalExtension};

pub fn add_type(conn: &Connection, name: &str, classification: Classification) -> LedgerResult<()> {
    conn.execute(
        "INSERT INTO types (name, is_outflow) VALUES (?1, ?2)",
        rusqlite::params![name, classification.is_outflow()],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(ref err, _) if err.code == ErrorCode::ConstraintViolation => {
            LedgerError::DuplicateType(name.to_string())
        }
        other => LedgerError::Db(other),
    })?;
    Ok(())
}

pub fn update_type(conn: &Connection, name: &str, classification: Classification) -> LedgerResult<()> {
    let rows = conn.execute(
        "UPDATE types SET is_outflow = ?1 WHERE name = ?2",
        rusqlite::params![classification.is_outflow(), name],
    )?;
    if rows == 0 {
        return Err(LedgerError::TypeNotFound(name.to_string()));
    }
    Ok(())
}

pub fn delete_type(conn: &Connection, name: &str) -> LedgerResult<()> {
    let rows = conn.execute("DELETE FROM types WHERE name = ?1", [name])?;
    if rows == 0 {
        return Err(LedgerError::TypeNotFound(name.to_string()));
    }
    Ok(())
}

pub fn get_type(conn: &Connection, name: &str) -> LedgerResult<Option<TypeRecord>> {
    let record = conn
        .query_row(
            "SELECT name, is_outflow FROM types WHERE name = ?1",
            [name],
            |row| {
                Ok(TypeRecord {
                    name: row.get(0)?,
                    classification: Classification::from_is_outflow(row.get(1)?),
                })
            },
        )
        .optional()?;
    Ok(record)
}

/// All types, ordered by name.
pub fn get_all_types(conn: &Connection) -> LedgerResult<Vec<TypeRecord>> {
    let mut stmt = conn.prepare("SELECT name, is_outflow FROM types ORDER BY name ASC")?;

    let iter = stmt.query_map([], |row| {
        Ok(TypeRecord {
            name: row.get(0)?,
            classification: Classification::from_is_outflow(row.get(1)?),
        })
    })?;

    let mut types = Vec::new();
    for record in iter {
        types.push(record?);
    }
    Ok(types)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::establish_test_connection;

    #[test]
    fn test_add_type_and_get() {
        let conn = establish_test_connection().unwrap();
        add_type(&conn, "SALAIRE", Classification::Inflow).unwrap();

        let record = get_type(&conn, "SALAIRE").unwrap().unwrap();
        assert_eq!(record.classification, Classification::Inflow);
    }

    #[test]
    fn test_add_type_duplicate() {
        let conn = establish_test_connection().unwrap();
        let result = add_type(&conn, "CB", Classification::Inflow);
        assert!(matches!(result, Err(LedgerError::DuplicateType(ref n)) if n == "CB"));
        let record = get_type(&conn, "CB").unwrap().unwrap();
        assert_eq!(record.classification, Classification::Outflow);
    }

    #[test]
    fn test_get_all_types_sorted_by_name() {
        let conn = establish_test_connection().unwrap();
        add_type(&conn, "ALIMENTATION", Classification::Outflow).unwrap();
        let names: Vec<String> = get_all_types(&conn).unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["ALIMENTATION", "CB", "CHEQUE", "VIREMENT"]);
    }

    #[test]
    fn test_update_type_reclassifies() {
        let conn = establish_test_connection().unwrap();
        update_type(&conn, "CHEQUE", Classification::Inflow).unwrap();
        let record = get_type(&conn, "CHEQUE").unwrap().unwrap();
        assert_eq!(record.classification, Classification::Inflow);
    }

    #[test]
    fn test_update_and_delete_missing_type() {
        let conn = establish_test_connection().unwrap();
        assert!(matches!(
            update_type(&conn, "NOPE", Classification::Inflow),
            Err(LedgerError::TypeNotFound(_))
        ));
        assert!(matches!(delete_type(&conn, "NOPE"), Err(LedgerError::TypeNotFound(_))));
    }

    #[test]
    fn test_get_type_missing_is_none() {
        let conn = establish_test_connection().unwrap();
        assert!(get_type(&conn, "NOPE").unwrap().is_none());
    }
}
