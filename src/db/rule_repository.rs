use crate::db::repository::{corrupt, date_column, format_date, optional_date_column};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Cadence, Money, RecurringRule};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};

const SELECT_RULE: &str = "SELECT id, label, amount, type_name, cadence, start_date, end_date, last_executed, day_of_month, active FROM recurring_rules";

fn rule_from_row(row: &Row<'_>) -> rusqlite::Result<RecurringRule> {
    let cadence_str: String = row.get(4)?;
    let cadence = cadence_str.parse::<Cadence>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, Type::Text, e.into())
    })?;
    Ok(RecurringRule {
        id: Some(row.get(0)?),
        label: row.get(1)?,
        amount: Money::from_cents(row.get(2)?),
        type_name: row.get(3)?,
        cadence,
        start_date: date_column(row, 5)?,
        end_date: optional_date_column(row, 6)?,
        last_executed: optional_date_column(row, 7)?,
        day_of_month: row.get(8)?,
        active: row.get(9)?,
    })
}

pub fn add_rule(conn: &Connection, rule: &RecurringRule) -> LedgerResult<i64> {
    conn.execute(
        "INSERT INTO recurring_rules (label, amount, type_name, cadence, start_date, end_date, last_executed, day_of_month, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            &rule.label,
            rule.amount.cents(),
            &rule.type_name,
            rule.cadence.as_str(),
            format_date(rule.start_date),
            rule.end_date.map(format_date),
            rule.last_executed.map(format_date),
            rule.day_of_month,
            rule.active,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_rule(conn: &Connection, id: i64, rule: &RecurringRule) -> LedgerResult<()> {
    let rows = conn.execute(
        "UPDATE recurring_rules SET label = ?1, amount = ?2, type_name = ?3, cadence = ?4, start_date = ?5,
         end_date = ?6, last_executed = ?7, day_of_month = ?8, active = ?9 WHERE id = ?10",
        rusqlite::params![
            &rule.label,
            rule.amount.cents(),
            &rule.type_name,
            rule.cadence.as_str(),
            format_date(rule.start_date),
            rule.end_date.map(format_date),
            rule.last_executed.map(format_date),
            rule.day_of_month,
            rule.active,
            id,
        ],
    )?;
    if rows == 0 {
        return Err(LedgerError::RuleNotFound(id));
    }
    Ok(())
}

pub fn set_last_executed(conn: &Connection, id: i64, day: NaiveDate) -> LedgerResult<()> {
    let rows = conn.execute(
        "UPDATE recurring_rules SET last_executed = ?1 WHERE id = ?2",
        rusqlite::params![format_date(day), id],
    )?;
    if rows == 0 {
        return Err(LedgerError::RuleNotFound(id));
    }
    Ok(())
}

pub fn remove_rule(conn: &Connection, id: i64) -> LedgerResult<()> {
    let rows = conn.execute("DELETE FROM recurring_rules WHERE id = ?1", [id])?;
    if rows == 0 {
        return Err(LedgerError::RuleNotFound(id));
    }
    Ok(())
}

pub fn get_rule(conn: &Connection, id: i64) -> LedgerResult<RecurringRule> {
    conn.query_row(&format!("{} WHERE id = ?1", SELECT_RULE), [id], rule_from_row)
        .optional()
        .map_err(corrupt)?
        .ok_or(LedgerError::RuleNotFound(id))
}

pub fn get_all_rules(conn: &Connection) -> LedgerResult<Vec<RecurringRule>> {
    query_rules(conn, &format!("{} ORDER BY id ASC", SELECT_RULE))
}

/// Active rules keyed by id. A row that cannot be decoded comes back as an
/// error next to its id instead of failing the whole read.
pub fn get_active_rules(conn: &Connection) -> LedgerResult<Vec<(i64, LedgerResult<RecurringRule>)>> {
    let mut stmt = conn.prepare(&format!("{} WHERE active = 1 ORDER BY id ASC", SELECT_RULE))?;
    let rules_iter = stmt.query_map([], |row| {
        let id: i64 = row.get(0)?;
        Ok((id, rule_from_row(row).map_err(corrupt)))
    })?;

    let mut rules = Vec::new();
    for rule in rules_iter {
        rules.push(rule?);
    }
    Ok(rules)
}

fn query_rules(conn: &Connection, sql: &str) -> LedgerResult<Vec<RecurringRule>> {
    let mut stmt = conn.prepare(sql)?;
    let rules_iter = stmt.query_map([], rule_from_row)?;

    let mut rules = Vec::new();
    for rule in rules_iter {
        rules.push(rule.map_err(corrupt)?);
    }
    Ok(rules)
}

pub fn count_rules_with_type(conn: &Connection, type_name: &str) -> LedgerResult<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM recurring_rules WHERE type_name = ?1",
        [type_name],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}
