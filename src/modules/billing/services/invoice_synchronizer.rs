// Keeps the per-student, per-period ledger consistent with the live fee
// configuration.
//
// Safe to call repeatedly and concurrently: every sync is one snapshot
// read, one resolution, and at most one write, with the storage-level
// unique key arbitrating duplicate writers. No lock is held across the
// resolver call and the write.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::core::{AppError, BillingPeriod, Result};
use crate::modules::audit::StaleViewSignal;
use crate::modules::billing::models::{MonthlyInvoice, NewInvoice, SyncOutcome, SyncReport};
use crate::modules::billing::repositories::{InsertOutcome, InvoiceStore};
use crate::modules::billing::services::fee_resolver::FeeResolver;
use crate::modules::students::repositories::{StudentBillingContext, StudentDirectory};

/// The admission fee rides on the very first invoice ever issued to the
/// student and is never charged again. An existing invoice carries it as
/// long as it remains the earliest-issued row in the ledger; a new invoice
/// only qualifies when the ledger is empty. Every write path that computes
/// an expected invoice total must go through this rule so recomputation
/// never strips the folded admission portion.
pub(crate) fn admission_applies(ledger: &[MonthlyInvoice], existing_id: Option<i64>) -> bool {
    match existing_id {
        Some(id) => ledger.iter().map(|inv| inv.id).min() == Some(id),
        None => ledger.is_empty(),
    }
}

pub struct InvoiceSynchronizer {
    directory: Arc<dyn StudentDirectory>,
    invoices: Arc<dyn InvoiceStore>,
    stale_view: Arc<dyn StaleViewSignal>,
    resolver: FeeResolver,
    due_day: u32,
}

impl InvoiceSynchronizer {
    pub fn new(
        directory: Arc<dyn StudentDirectory>,
        invoices: Arc<dyn InvoiceStore>,
        stale_view: Arc<dyn StaleViewSignal>,
        due_day: u32,
    ) -> Self {
        Self {
            directory,
            invoices,
            stale_view,
            resolver: FeeResolver::new(),
            due_day,
        }
    }

    /// Synchronize the current calendar month.
    pub async fn sync_current(&self, student_id: i64) -> Result<SyncReport> {
        self.sync_invoice(student_id, BillingPeriod::current()).await
    }

    /// Ensure a single canonical invoice exists for the student and period:
    /// create it if absent and something is due, rewrite it if unpaid and
    /// stale, leave it untouched if paid or already correct.
    pub async fn sync_invoice(
        &self,
        student_id: i64,
        period: BillingPeriod,
    ) -> Result<SyncReport> {
        if period.is_admission() || period.month > 12 {
            return Err(AppError::validation(format!(
                "Cannot synchronize period {}: month must be 1-12",
                period
            )));
        }

        let context = self.load_active_context(student_id).await?;

        let resolved = self.resolver.resolve(
            &context.student,
            context.latest_enrollment.as_ref(),
            context.active_plan.as_ref(),
        );

        let existing = self
            .invoices
            .find(student_id, period.month, period.year)
            .await?;
        let ledger = self.invoices.list_for_student(student_id).await?;

        let admission_amount =
            if admission_applies(&ledger, existing.as_ref().map(|inv| inv.id)) {
                resolved.admission_amount
            } else {
                Decimal::ZERO
            };

        let total = resolved.monthly_amount + admission_amount;

        match existing {
            None => {
                if total <= Decimal::ZERO {
                    debug!(student_id, %period, "Nothing due; no invoice issued");
                    return Ok(SyncReport::new(SyncOutcome::Skipped, None));
                }

                self.create_invoice(student_id, period, total, resolved.plan_id)
                    .await
            }
            Some(invoice) if invoice.is_paid() => {
                // Paid invoices are closed facts, stale or not.
                Ok(SyncReport::new(SyncOutcome::AlreadyExisted, Some(invoice)))
            }
            Some(invoice) => {
                let stale = invoice.amount != total || invoice.plan_id != resolved.plan_id;
                if !stale {
                    return Ok(SyncReport::new(SyncOutcome::AlreadyExisted, Some(invoice)));
                }

                self.rewrite_invoice(invoice, total, resolved.plan_id).await
            }
        }
    }

    /// Live monthly amount for display. Never writes.
    pub async fn current_monthly_fee(&self, student_id: i64) -> Result<Decimal> {
        let context = self.load_active_context(student_id).await?;

        let resolved = self.resolver.resolve(
            &context.student,
            context.latest_enrollment.as_ref(),
            context.active_plan.as_ref(),
        );

        Ok(resolved.monthly_amount)
    }

    async fn load_active_context(&self, student_id: i64) -> Result<StudentBillingContext> {
        let context = self
            .directory
            .find_with_billing_context(student_id)
            .await?
            .ok_or(AppError::StudentNotFound(student_id))?;

        if !context.student.active {
            return Err(AppError::StudentInactive(student_id));
        }

        Ok(context)
    }

    async fn create_invoice(
        &self,
        student_id: i64,
        period: BillingPeriod,
        amount: Decimal,
        plan_id: Option<i64>,
    ) -> Result<SyncReport> {
        let new_invoice = NewInvoice {
            student_id,
            month: period.month,
            year: period.year,
            amount,
            plan_id,
            due_date: period.due_date(self.due_day),
        };

        match self.invoices.insert(new_invoice).await? {
            InsertOutcome::Inserted(invoice) => {
                info!(student_id, %period, amount = %invoice.amount, "Invoice issued");
                self.stale_view.billing_changed(student_id).await;
                Ok(SyncReport::new(SyncOutcome::Created, Some(invoice)))
            }
            InsertOutcome::DuplicateKey => {
                // A concurrent sync issued this period's invoice first.
                debug!(student_id, %period, "Duplicate insert absorbed");
                let invoice = self
                    .invoices
                    .find(student_id, period.month, period.year)
                    .await?;
                Ok(SyncReport::new(SyncOutcome::AlreadyExisted, invoice))
            }
        }
    }

    async fn rewrite_invoice(
        &self,
        invoice: MonthlyInvoice,
        amount: Decimal,
        plan_id: Option<i64>,
    ) -> Result<SyncReport> {
        let written = self.invoices.update_unpaid(invoice.id, amount, plan_id).await?;
        if !written {
            // The invoice was paid between the snapshot read and the write;
            // it is closed now and stays as-is.
            return Ok(SyncReport::new(SyncOutcome::AlreadyExisted, Some(invoice)));
        }

        info!(
            student_id = invoice.student_id,
            period = %invoice.period(),
            old_amount = %invoice.amount,
            new_amount = %amount,
            "Stale unpaid invoice rewritten"
        );
        self.stale_view.billing_changed(invoice.student_id).await;

        let updated = MonthlyInvoice {
            amount,
            plan_id,
            ..invoice
        };
        Ok(SyncReport::new(SyncOutcome::Updated, Some(updated)))
    }
}
