use crate::config::LedgerOptions;
use crate::db::{repository, rule_repository};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{LedgerEntry, RecurringRule};
use crate::operations::types::ensure_known_type;
use chrono::NaiveDate;
use rusqlite::Connection;

#[derive(Debug)]
pub struct RuleFailure {
    pub rule_id: i64,
    pub error: LedgerError,
}

/// Outcome of one scheduler pass.
#[derive(Debug, Default)]
pub struct PostingSummary {
    pub posted: usize,
    pub failed: Vec<RuleFailure>,
}

pub fn create_rule_db(conn: &Connection, rule: &RecurringRule, options: &LedgerOptions) -> LedgerResult<i64> {
    rule.validate()?;
    ensure_known_type(conn, &rule.type_name, options)?;
    let id = rule_repository::add_rule(conn, rule)?;
    tracing::info!(id, label = %rule.label, cadence = %rule.cadence, "recurring rule created");
    Ok(id)
}

pub fn update_rule_db(
    conn: &Connection,
    id: i64,
    rule: &RecurringRule,
    options: &LedgerOptions,
) -> LedgerResult<()> {
    rule.validate()?;
    ensure_known_type(conn, &rule.type_name, options)?;
    rule_repository::update_rule(conn, id, rule)
}

/// Posts one entry for every active rule that is due on `today`.
///
/// Each rule is handled in its own SQLite transaction: the entry and the new
/// `last_executed` are written together or not at all. A failing rule is
/// recorded and the pass moves on. Missed periods are not backfilled; a rule
/// posts at most once per call and its schedule resumes from `today`.
pub fn run_due_postings(conn: &Connection, today: NaiveDate, options: &LedgerOptions) -> LedgerResult<PostingSummary> {
    let rules = rule_repository::get_active_rules(conn)?;
    let mut summary = PostingSummary::default();

    for (rule_id, rule) in rules {
        let rule = match rule {
            Ok(rule) => rule,
            Err(error) => {
                tracing::warn!(rule_id, %error, "recurring rule unreadable");
                summary.failed.push(RuleFailure { rule_id, error });
                continue;
            }
        };
        if !rule.is_due(today) {
            continue;
        }
        match post_rule(conn, rule_id, &rule, today, options) {
            Ok(entry_id) => {
                tracing::debug!(rule_id, entry_id, label = %rule.label, "recurring entry posted");
                summary.posted += 1;
            }
            Err(error) => {
                tracing::warn!(rule_id, %error, "recurring posting failed");
                summary.failed.push(RuleFailure { rule_id, error });
            }
        }
    }

    tracing::info!(
        posted = summary.posted,
        failed = summary.failed.len(),
        %today,
        "recurring postings run"
    );
    Ok(summary)
}

fn post_rule(
    conn: &Connection,
    rule_id: i64,
    rule: &RecurringRule,
    today: NaiveDate,
    options: &LedgerOptions,
) -> LedgerResult<i64> {
    ensure_known_type(conn, &rule.type_name, options)?;
    let tx = conn.unchecked_transaction()?;
    let entry = LedgerEntry::new(today, rule.label.clone(), rule.amount, rule.type_name.clone());
    let entry_id = repository::add_entry(&tx, &entry)?;
    rule_repository::set_last_executed(&tx, rule_id, today)?;
    tx.commit()?;
    Ok(entry_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TypeCheck;
    use crate::db::connection::establish_test_connection;
    use crate::models::{Cadence, Money};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_rule(label: &str, cadence: Cadence, start: NaiveDate) -> RecurringRule {
        RecurringRule::new(
            label.to_string(),
            Money::from_cents(2500),
            "CB".to_string(),
            cadence,
            start,
        )
    }

    #[test]
    fn test_due_rule_posts_entry_and_advances() {
        let conn = establish_test_connection().unwrap();
        let options = LedgerOptions::default();
        let id = create_rule_db(&conn, &create_test_rule("Gym", Cadence::Monthly, day(2025, 3, 1)), &options).unwrap();

        let summary = run_due_postings(&conn, day(2025, 3, 1), &options).unwrap();
        assert_eq!(summary.posted, 1);
        assert!(summary.failed.is_empty());

        let entries = repository::get_all_entries(&conn).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].date, day(2025, 3, 1));
        assert_eq!(entries[0].label, "Gym");
        assert_eq!(entries[0].amount, Money::from_cents(2500));
        assert_eq!(entries[0].type_name, "CB");
        assert!(!entries[0].is_checked());

        let rule = rule_repository::get_rule(&conn, id).unwrap();
        assert_eq!(rule.last_executed, Some(day(2025, 3, 1)));
    }

    #[test]
    fn test_second_run_same_day_posts_nothing() {
        let conn = establish_test_connection().unwrap();
        let options = LedgerOptions::default();
        create_rule_db(&conn, &create_test_rule("Bread", Cadence::Daily, day(2025, 3, 1)), &options).unwrap();

        assert_eq!(run_due_postings(&conn, day(2025, 3, 4), &options).unwrap().posted, 1);
        assert_eq!(run_due_postings(&conn, day(2025, 3, 4), &options).unwrap().posted, 0);
        assert_eq!(repository::transaction_count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_missed_periods_are_not_backfilled() {
        let conn = establish_test_connection().unwrap();
        let options = LedgerOptions::default();
        let id = create_rule_db(&conn, &create_test_rule("Rent", Cadence::Monthly, day(2025, 1, 5)), &options).unwrap();

        run_due_postings(&conn, day(2025, 1, 5), &options).unwrap();
        let summary = run_due_postings(&conn, day(2025, 6, 20), &options).unwrap();

        assert_eq!(summary.posted, 1);
        assert_eq!(repository::transaction_count(&conn).unwrap(), 2);
        let rule = rule_repository::get_rule(&conn, id).unwrap();
        assert_eq!(rule.last_executed, Some(day(2025, 6, 20)));
        assert_eq!(rule.next_execution_date(), day(2025, 7, 5));
    }

    #[test]
    fn test_rules_not_due_are_skipped() {
        let conn = establish_test_connection().unwrap();
        let options = LedgerOptions::default();
        create_rule_db(&conn, &create_test_rule("Future", Cadence::Daily, day(2025, 9, 1)), &options).unwrap();
        let mut ended = create_test_rule("Ended", Cadence::Daily, day(2025, 1, 1));
        ended.end_date = Some(day(2025, 1, 31));
        create_rule_db(&conn, &ended, &options).unwrap();
        let mut paused = create_test_rule("Paused", Cadence::Daily, day(2025, 1, 1));
        paused.active = false;
        create_rule_db(&conn, &paused, &options).unwrap();

        let summary = run_due_postings(&conn, day(2025, 8, 1), &options).unwrap();
        assert_eq!(summary.posted, 0);
        assert_eq!(repository::transaction_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_failing_rule_does_not_block_others() {
        let conn = establish_test_connection().unwrap();
        let lenient = LedgerOptions { type_check: TypeCheck::Lenient };
        let strict = LedgerOptions::default();

        let mut orphan = create_test_rule("Orphan", Cadence::Daily, day(2025, 1, 1));
        orphan.type_name = "GONE".to_string();
        let orphan_id = create_rule_db(&conn, &orphan, &lenient).unwrap();
        create_rule_db(&conn, &create_test_rule("Valid", Cadence::Daily, day(2025, 1, 1)), &strict).unwrap();

        let summary = run_due_postings(&conn, day(2025, 1, 2), &strict).unwrap();
        assert_eq!(summary.posted, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].rule_id, orphan_id);
        assert!(matches!(summary.failed[0].error, LedgerError::UnknownType(_)));

        let orphan = rule_repository::get_rule(&conn, orphan_id).unwrap();
        assert_eq!(orphan.last_executed, None);
    }

    #[test]
    fn test_unreadable_rule_does_not_block_others() {
        let conn = establish_test_connection().unwrap();
        let options = LedgerOptions::default();
        conn.execute(
            "INSERT INTO recurring_rules (label, amount, type_name, cadence, start_date) VALUES ('Broken', 100, 'CB', 'daily', '01/01/2025')",
            [],
        )
        .unwrap();
        let broken_id = conn.last_insert_rowid();
        create_rule_db(&conn, &create_test_rule("Valid", Cadence::Daily, day(2025, 1, 1)), &options).unwrap();

        let summary = run_due_postings(&conn, day(2025, 1, 2), &options).unwrap();
        assert_eq!(summary.posted, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].rule_id, broken_id);
        assert!(matches!(summary.failed[0].error, LedgerError::CorruptRow(_)));
        assert_eq!(repository::transaction_count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_create_rule_validates_anchor() {
        let conn = establish_test_connection().unwrap();
        let mut rule = create_test_rule("Bad", Cadence::Monthly, day(2025, 1, 1));
        rule.day_of_month = 40;
        assert!(matches!(
            create_rule_db(&conn, &rule, &LedgerOptions::default()),
            Err(LedgerError::InvalidAnchor(40))
        ));
    }

    #[test]
    fn test_monthly_anchor_31_posts_on_last_day_of_february() {
        let conn = establish_test_connection().unwrap();
        let options = LedgerOptions::default();
        create_rule_db(&conn, &create_test_rule("Savings", Cadence::Monthly, day(2025, 1, 31)), &options).unwrap();

        assert_eq!(run_due_postings(&conn, day(2025, 1, 31), &options).unwrap().posted, 1);
        assert_eq!(run_due_postings(&conn, day(2025, 2, 27), &options).unwrap().posted, 0);
        assert_eq!(run_due_postings(&conn, day(2025, 2, 28), &options).unwrap().posted, 1);
    }
}
