use chrono::{Datelike, Duration, Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

use super::money::Money;
use crate::error::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Cadence {
    pub fn as_str(self) -> &'static str {
        match self {
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
            Cadence::Monthly => "monthly",
            Cadence::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Cadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Cadence::Daily),
            "weekly" => Ok(Cadence::Weekly),
            "monthly" => Ok(Cadence::Monthly),
            "yearly" => Ok(Cadence::Yearly),
            other => Err(format!("Invalid cadence '{}'. Use daily, weekly, monthly or yearly.", other)),
        }
    }
}

/// Template that periodically produces a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringRule {
    pub id: Option<i64>,
    pub label: String,
    pub amount: Money,
    pub type_name: String,
    pub cadence: Cadence,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub last_executed: Option<NaiveDate>,
    /// Only read for monthly rules.
    pub day_of_month: u32,
    pub active: bool,
}

impl RecurringRule {
    pub fn new(
        label: String,
        amount: Money,
        type_name: String,
        cadence: Cadence,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            label,
            amount: amount.abs(),
            type_name,
            cadence,
            start_date,
            end_date: None,
            last_executed: None,
            day_of_month: if cadence == Cadence::Monthly { start_date.day() } else { 1 },
            active: true,
        }
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if !(1..=31).contains(&self.day_of_month) {
            return Err(LedgerError::InvalidAnchor(self.day_of_month));
        }
        Ok(())
    }

    pub fn next_execution_date(&self) -> NaiveDate {
        let Some(last) = self.last_executed else {
            return self.start_date;
        };
        match self.cadence {
            Cadence::Daily => last + Duration::days(1),
            Cadence::Weekly => last + Duration::weeks(1),
            Cadence::Monthly => next_month_on(last, self.day_of_month),
            Cadence::Yearly => last.checked_add_months(Months::new(12)).unwrap_or(last),
        }
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        if !self.active {
            return false;
        }
        if self.end_date.is_some_and(|end| today > end) {
            return false;
        }
        if today < self.start_date {
            return false;
        }
        self.next_execution_date() <= today
    }
}

/// Moves to the following month and lands on `anchor`, clamped to the last
/// day of that month.
fn next_month_on(from: NaiveDate, anchor: u32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(from.year(), from.month(), 1).unwrap_or(from);
    let Some(target) = first.checked_add_months(Months::new(1)) else {
        return from;
    };
    let day = anchor.clamp(1, days_in_month(target));
    target.with_day(day).unwrap_or(target)
}

fn days_in_month(first_of_month: NaiveDate) -> u32 {
    first_of_month
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}
