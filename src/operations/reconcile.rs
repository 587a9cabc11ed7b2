use crate::db::repository;
use crate::error::LedgerResult;
use crate::models::{Classification, LedgerEntry, Money};
use chrono::NaiveDate;
use rusqlite::Connection;

/// `checked - (remaining - bank)`. Zero once the checked entries are exactly
/// the ones the bank has recorded.
pub fn difference(checked_total: Money, remaining_total: Money, bank_balance: Money) -> Money {
    checked_total - (remaining_total - bank_balance)
}

/// In-memory counterpart of the store totals: sums each entry's magnitude
/// signed by the classification `classify` returns for its type.
pub fn signed_total<'a, I, F>(entries: I, classify: F) -> Money
where
    I: IntoIterator<Item = &'a LedgerEntry>,
    F: Fn(&str) -> Classification,
{
    entries
        .into_iter()
        .map(|entry| classify(&entry.type_name).sign(entry.amount))
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationStatus {
    pub bank_balance: Money,
    pub remaining_total: Money,
    pub checked_total: Money,
    pub difference: Money,
}

/// View state for matching entries against a bank statement. Nothing here is
/// persisted; ending a session leaves stored check flags untouched.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    bank_balance: Option<Money>,
    hide_checked: bool,
}

impl Reconciliation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, bank_balance: Money) {
        tracing::info!(%bank_balance, "reconciliation session started");
        self.bank_balance = Some(bank_balance);
    }

    pub fn end(&mut self) {
        if self.bank_balance.take().is_some() {
            tracing::info!("reconciliation session ended");
        }
    }

    pub fn is_active(&self) -> bool {
        self.bank_balance.is_some()
    }

    pub fn bank_balance(&self) -> Option<Money> {
        self.bank_balance
    }

    pub fn set_hide_checked(&mut self, hide: bool) {
        self.hide_checked = hide;
    }

    pub fn hides_checked(&self) -> bool {
        self.hide_checked
    }

    /// True while either the session or the hide-checked mode is on.
    pub fn only_unchecked(&self) -> bool {
        self.is_active() || self.hide_checked
    }

    pub fn visible<'a>(&self, entries: &'a [LedgerEntry]) -> Vec<&'a LedgerEntry> {
        let only_unchecked = self.only_unchecked();
        entries
            .iter()
            .filter(|entry| !(only_unchecked && entry.is_checked()))
            .collect()
    }

    /// Entries to show, read fresh from the store.
    pub fn visible_entries(&self, conn: &Connection) -> LedgerResult<Vec<LedgerEntry>> {
        let entries = repository::get_all_entries(conn)?;
        Ok(self.visible(&entries).into_iter().cloned().collect())
    }

    /// Toggles one entry exactly as the store does outside a session.
    pub fn toggle(&self, conn: &Connection, id: i64, today: NaiveDate) -> LedgerResult<LedgerEntry> {
        let entry = repository::toggle_checked(conn, id, today)?;
        tracing::debug!(id, checked = entry.is_checked(), in_session = self.is_active(), "entry toggled");
        Ok(entry)
    }

    /// Current totals against the session's bank balance, or `None` when no
    /// session is active.
    pub fn status(&self, conn: &Connection) -> LedgerResult<Option<ReconciliationStatus>> {
        let Some(bank_balance) = self.bank_balance else {
            return Ok(None);
        };
        let remaining_total = repository::remaining_total(conn)?;
        let checked_total = repository::checked_total(conn)?;
        Ok(Some(ReconciliationStatus {
            bank_balance,
            remaining_total,
            checked_total,
            difference: difference(checked_total, remaining_total, bank_balance),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::establish_test_connection;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn add(conn: &Connection, cents: i64, type_name: &str) -> i64 {
        repository::add_entry(
            conn,
            &LedgerEntry::new(day(2025, 4, 1), "x".to_string(), Money::from_cents(cents), type_name.to_string()),
        )
        .unwrap()
    }

    #[test]
    fn test_difference_arithmetic() {
        let hundred = Money::from_cents(10000);
        assert_eq!(difference(Money::ZERO, hundred, hundred), Money::ZERO);
        assert_eq!(
            difference(Money::from_cents(-3000), hundred, hundred),
            Money::from_cents(-3000)
        );
    }

    #[test]
    fn test_signed_total_matches_store_totals() {
        let conn = establish_test_connection().unwrap();
        add(&conn, 4550, "VIREMENT");
        add(&conn, 1999, "CB");
        add(&conn, 10, "GHOST");
        let checked = add(&conn, 700, "CHEQUE");
        repository::toggle_checked(&conn, checked, day(2025, 4, 2)).unwrap();

        let entries = repository::get_all_entries(&conn).unwrap();
        let classify = |name: &str| crate::operations::types::classification_of(&conn, name).unwrap();

        assert_eq!(signed_total(&entries, classify), repository::remaining_total(&conn).unwrap());
        assert_eq!(
            signed_total(entries.iter().filter(|e| e.is_checked()), classify),
            repository::checked_total(&conn).unwrap()
        );
        assert_eq!(signed_total(&entries, classify), Money::from_cents(4550 - 1999 - 10 - 700));
    }

    #[test]
    fn test_session_status_tracks_checked_entries() {
        let conn = establish_test_connection().unwrap();
        add(&conn, 13000, "VIREMENT");
        let rent = add(&conn, 2000, "CB");
        let phone = add(&conn, 1000, "CHEQUE");

        let mut session = Reconciliation::new();
        assert!(session.status(&conn).unwrap().is_none());

        session.start(Money::from_cents(10000));
        let status = session.status(&conn).unwrap().unwrap();
        assert_eq!(status.remaining_total, Money::from_cents(10000));
        assert_eq!(status.checked_total, Money::ZERO);
        assert_eq!(status.difference, Money::ZERO);

        session.toggle(&conn, rent, day(2025, 4, 10)).unwrap();
        session.toggle(&conn, phone, day(2025, 4, 10)).unwrap();
        let status = session.status(&conn).unwrap().unwrap();
        assert_eq!(status.checked_total, Money::from_cents(-3000));
        assert_eq!(status.difference, Money::from_cents(-3000));
    }

    #[test]
    fn test_session_hides_checked_entries() {
        let conn = establish_test_connection().unwrap();
        let a = add(&conn, 100, "CB");
        add(&conn, 200, "CB");

        let mut session = Reconciliation::new();
        assert_eq!(session.visible_entries(&conn).unwrap().len(), 2);

        session.start(Money::ZERO);
        session.toggle(&conn, a, day(2025, 4, 2)).unwrap();
        let visible = session.visible_entries(&conn).unwrap();
        assert_eq!(visible.len(), 1);
        assert!(visible.iter().all(|e| e.id != Some(a)));
    }

    #[test]
    fn test_visible_entries_follow_hide_checked_outside_session() {
        let conn = establish_test_connection().unwrap();
        let a = add(&conn, 100, "CB");
        add(&conn, 200, "CB");
        repository::toggle_checked(&conn, a, day(2025, 4, 2)).unwrap();

        let mut view = Reconciliation::new();
        let all = repository::get_all_entries(&conn).unwrap();
        assert_eq!(view.visible_entries(&conn).unwrap().len(), view.visible(&all).len());

        view.set_hide_checked(true);
        let visible = view.visible_entries(&conn).unwrap();
        assert_eq!(visible.len(), 1);
        assert!(!visible[0].is_checked());
    }

    #[test]
    fn test_end_session_keeps_check_flags() {
        let conn = establish_test_connection().unwrap();
        let a = add(&conn, 100, "CB");

        let mut session = Reconciliation::new();
        session.start(Money::from_cents(500));
        session.toggle(&conn, a, day(2025, 4, 2)).unwrap();
        session.end();

        assert!(!session.is_active());
        assert_eq!(session.bank_balance(), None);
        assert!(repository::get_entry(&conn, a).unwrap().is_checked());
        assert_eq!(session.visible_entries(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_hide_checked_composes_with_session() {
        let mut entries = vec![
            LedgerEntry::new(day(2025, 1, 1), "a".to_string(), Money::from_cents(1), "CB".to_string()),
            LedgerEntry::new(day(2025, 1, 2), "b".to_string(), Money::from_cents(2), "CB".to_string()),
        ];
        entries[0].mark_checked(day(2025, 1, 3));

        let mut view = Reconciliation::new();
        assert_eq!(view.visible(&entries).len(), 2);

        view.set_hide_checked(true);
        assert_eq!(view.visible(&entries).len(), 1);

        view.start(Money::ZERO);
        assert_eq!(view.visible(&entries).len(), 1);

        view.set_hide_checked(false);
        assert_eq!(view.visible(&entries).len(), 1);

        view.end();
        assert_eq!(view.visible(&entries).len(), 2);
    }
}
