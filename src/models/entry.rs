use chrono::NaiveDate;

use super::money::Money;

/// One recorded money movement.
///
/// `amount` is always a non-negative magnitude: the sign is derived from the
/// classification of `type_name` when totals are computed. `check_date` is
/// `Some` exactly when `checked` is true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub label: String,
    pub amount: Money,
    checked: bool,
    check_date: Option<NaiveDate>,
    pub type_name: String,
}

impl LedgerEntry {
    pub fn new(date: NaiveDate, label: String, amount: Money, type_name: String) -> Self {
        Self {
            id: None,
            date,
            label,
            amount: amount.abs(),
            checked: false,
            check_date: None,
            type_name,
        }
    }

    /// Rebuilds an entry read back from storage, repairing a stored row that
    /// violates the check-date invariant.
    pub(crate) fn from_parts(
        id: i64,
        date: NaiveDate,
        label: String,
        amount: Money,
        checked: bool,
        check_date: Option<NaiveDate>,
        type_name: String,
    ) -> Self {
        Self {
            id: Some(id),
            date,
            label,
            amount: amount.abs(),
            checked,
            check_date: if checked { check_date.or(Some(date)) } else { None },
            type_name,
        }
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount.abs();
        self
    }

    pub fn checked_on(mut self, day: NaiveDate) -> Self {
        self.mark_checked(day);
        self
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn check_date(&self) -> Option<NaiveDate> {
        self.check_date
    }

    pub fn mark_checked(&mut self, day: NaiveDate) {
        self.checked = true;
        self.check_date = Some(day);
    }

    pub fn mark_unchecked(&mut self) {
        self.checked = false;
        self.check_date = None;
    }

    /// Flips the checked state in one step and returns the new state.
    pub fn toggle_checked(&mut self, today: NaiveDate) -> bool {
        if self.checked {
            self.mark_unchecked();
        } else {
            self.mark_checked(today);
        }
        self.checked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_entry_stores_magnitude_only() {
        let entry = LedgerEntry::new(
            day(2025, 3, 1),
            "Refund".to_string(),
            Money::from_cents(-1999),
            "CB".to_string(),
        );
        assert_eq!(entry.amount, Money::from_cents(1999));
        assert!(!entry.is_checked());
        assert_eq!(entry.check_date(), None);
    }

    #[test]
    fn test_toggle_sets_and_clears_check_date() {
        let mut entry = LedgerEntry::new(
            day(2025, 3, 1),
            "Groceries".to_string(),
            Money::from_cents(4200),
            "CB".to_string(),
        );
        assert!(entry.toggle_checked(day(2025, 3, 5)));
        assert_eq!(entry.check_date(), Some(day(2025, 3, 5)));

        assert!(!entry.toggle_checked(day(2025, 3, 6)));
        assert_eq!(entry.check_date(), None);
    }

    #[test]
    fn test_from_parts_drops_stray_check_date() {
        let entry = LedgerEntry::from_parts(
            7,
            day(2025, 1, 1),
            "x".to_string(),
            Money::from_cents(1),
            false,
            Some(day(2025, 1, 2)),
            "CB".to_string(),
        );
        assert_eq!(entry.check_date(), None);
    }
}
