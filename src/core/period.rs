// Billing period arithmetic.
//
// An invoice is keyed by (student_id, month, year). Month 0 is the reserved
// sentinel for the one-time admission charge; months 1-12 are calendar
// billing periods.

use chrono::{Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single billing period: one calendar month of one year, or the
/// admission sentinel (`month == 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub month: u32,
    pub year: i32,
}

impl BillingPeriod {
    /// Reserved month number for the one-time admission charge.
    pub const ADMISSION_MONTH: u32 = 0;

    /// Callers pass month 0 (admission) or 1-12; the synchronizer rejects
    /// anything else before it reaches storage.
    pub fn new(month: u32, year: i32) -> Self {
        Self { month, year }
    }

    /// The period containing today's date (UTC).
    pub fn current() -> Self {
        Self::from_date(Utc::now().date_naive())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
        }
    }

    pub fn is_admission(&self) -> bool {
        self.month == Self::ADMISSION_MONTH
    }

    /// The following calendar period. Not defined for the admission sentinel.
    pub fn next(&self) -> Self {
        debug_assert!(!self.is_admission());
        if self.month == 12 {
            Self::new(1, self.year + 1)
        } else {
            Self::new(self.month + 1, self.year)
        }
    }

    /// First day of the period's calendar month.
    pub fn first_day(&self) -> NaiveDate {
        debug_assert!(!self.is_admission());
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(self.year, 1, 1).unwrap())
    }

    /// Due date for invoices issued against this period.
    pub fn due_date(&self, due_day: u32) -> NaiveDate {
        self.first_day() + chrono::Duration::days(due_day as i64 - 1)
    }
}

impl PartialOrd for BillingPeriod {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BillingPeriod {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.year, self.month).cmp(&(other.year, other.month))
    }
}

impl std::fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_admission() {
            write!(f, "{}-admission", self.year)
        } else {
            write!(f, "{}-{:02}", self.year, self.month)
        }
    }
}

/// Round a date up to the first of the next month, unless it already falls
/// on the first of a month.
pub fn normalize_to_month_start(date: NaiveDate) -> NaiveDate {
    if date.day() == 1 {
        date
    } else {
        let first = date.with_day(1).unwrap_or(date);
        first + Months::new(1)
    }
}
