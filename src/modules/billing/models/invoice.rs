// Monthly invoice ledger unit.
//
// At most one invoice exists per (student_id, month, year); month 0 is the
// reserved admission sentinel. An invoice may be rewritten in place while
// unpaid; once paid it is a closed historical fact and is never recomputed.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::BillingPeriod;

/// Invoice status lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    /// Issued, awaiting payment; amount may still be recomputed
    #[serde(rename = "unpaid")]
    Unpaid,

    /// Settled by a ledger transaction; immutable from here on
    #[serde(rename = "paid")]
    Paid,
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Unpaid => write!(f, "unpaid"),
            InvoiceStatus::Paid => write!(f, "paid"),
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(InvoiceStatus::Unpaid),
            "paid" => Ok(InvoiceStatus::Paid),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

/// One row of the per-student invoice ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyInvoice {
    pub id: i64,
    pub student_id: i64,
    pub month: u32,
    pub year: i32,
    pub amount: Decimal,
    pub status: InvoiceStatus,
    /// Plan that produced the amount, when plan-driven rather than
    /// hierarchy-driven.
    pub plan_id: Option<i64>,
    pub due_date: NaiveDate,
    pub issued_at: DateTime<Utc>,
}

impl MonthlyInvoice {
    pub fn period(&self) -> BillingPeriod {
        BillingPeriod::new(self.month, self.year)
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    /// Admission-sentinel invoices are exempt from self-healing.
    pub fn is_admission(&self) -> bool {
        self.month == BillingPeriod::ADMISSION_MONTH
    }
}

/// Fields for a not-yet-persisted invoice. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub student_id: i64,
    pub month: u32,
    pub year: i32,
    pub amount: Decimal,
    pub plan_id: Option<i64>,
    pub due_date: NaiveDate,
}
