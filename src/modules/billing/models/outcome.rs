// Outcome tags returned by the synchronizer so single-student callers can
// report precisely what happened and the bulk generator can tally buckets.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::invoice::MonthlyInvoice;

/// What one synchronization did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOutcome {
    /// No invoice existed for the period; one was issued
    #[serde(rename = "created")]
    Created,
    /// An unpaid invoice existed but was stale; rewritten in place
    #[serde(rename = "updated")]
    Updated,
    /// An invoice existed and needed no change (or is paid and closed)
    #[serde(rename = "already_existed")]
    AlreadyExisted,
    /// Nothing is due for the period; no invoice was issued
    #[serde(rename = "skipped")]
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    pub invoice: Option<MonthlyInvoice>,
}

impl SyncReport {
    pub fn new(outcome: SyncOutcome, invoice: Option<MonthlyInvoice>) -> Self {
        Self { outcome, invoice }
    }
}

/// A not-yet-issued future period and what it would cost today. Never
/// persisted; recomputed live on every call so tier and plan changes are
/// visible immediately.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectedInvoice {
    pub month: u32,
    pub year: i32,
    pub amount: Decimal,
    pub is_advance: bool,
}

/// Aggregate result of one bulk generation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkSummary {
    pub created: usize,
    pub updated: usize,
    pub existed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub total: usize,
}

impl BulkSummary {
    pub fn record(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::Updated => self.updated += 1,
            SyncOutcome::AlreadyExisted => self.existed += 1,
            SyncOutcome::Skipped => self.skipped += 1,
        }
        self.total += 1;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
        self.total += 1;
    }

    pub fn changed_anything(&self) -> bool {
        self.created + self.updated > 0
    }
}
