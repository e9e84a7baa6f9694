// Forward projection of future dues.
//
// Projections are synthetic: derived on every call from the live fee
// configuration and never persisted, so a mid-enrollment tier or plan
// change is reflected immediately in what the student is shown as due.
// As a side effect, a projection pass self-heals issued unpaid invoices
// whose amount has drifted from the live monthly fee.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::core::period::normalize_to_month_start;
use crate::core::{AppError, BillingPeriod, Result};
use crate::modules::audit::StaleViewSignal;
use crate::modules::billing::models::{MonthlyInvoice, ProjectedInvoice};
use crate::modules::billing::repositories::InvoiceStore;
use crate::modules::billing::services::fee_resolver::{FeeResolver, ResolvedFee};
use crate::modules::billing::services::invoice_synchronizer::admission_applies;
use crate::modules::students::models::Batch;
use crate::modules::students::repositories::StudentDirectory;

pub struct AdvanceProjector {
    directory: Arc<dyn StudentDirectory>,
    invoices: Arc<dyn InvoiceStore>,
    stale_view: Arc<dyn StaleViewSignal>,
    resolver: FeeResolver,
    default_horizon: u32,
}

impl AdvanceProjector {
    pub fn new(
        directory: Arc<dyn StudentDirectory>,
        invoices: Arc<dyn InvoiceStore>,
        stale_view: Arc<dyn StaleViewSignal>,
        default_horizon: u32,
    ) -> Self {
        Self {
            directory,
            invoices,
            stale_view,
            resolver: FeeResolver::new(),
            default_horizon,
        }
    }

    /// Project future not-yet-issued periods starting from the month after
    /// the current one.
    pub async fn project_upcoming(
        &self,
        student_id: i64,
        horizon_months: Option<u32>,
    ) -> Result<Vec<ProjectedInvoice>> {
        let horizon = horizon_months.unwrap_or(self.default_horizon);
        self.project_from(student_id, Utc::now().date_naive(), horizon)
            .await
    }

    /// Projection with an explicit "today", which anchors the first
    /// projected period at the following month.
    pub async fn project_from(
        &self,
        student_id: i64,
        today: NaiveDate,
        horizon_months: u32,
    ) -> Result<Vec<ProjectedInvoice>> {
        let context = self
            .directory
            .find_with_billing_context(student_id)
            .await?
            .ok_or(AppError::StudentNotFound(student_id))?;

        if !context.student.active {
            return Err(AppError::StudentInactive(student_id));
        }

        let resolved = self.resolver.resolve(
            &context.student,
            context.latest_enrollment.as_ref(),
            context.active_plan.as_ref(),
        );

        let ledger = self.invoices.list_for_student(student_id).await?;

        self.heal_stale_invoices(student_id, &ledger, &resolved)
            .await?;

        // No enrollment means no window to project into.
        let Some(enrollment) = context.latest_enrollment.as_ref() else {
            return Ok(Vec::new());
        };

        if resolved.monthly_amount <= Decimal::ZERO {
            return Ok(Vec::new());
        }

        let window_end = enrollment_window_end(&enrollment.batch);
        let issued: HashSet<(u32, i32)> =
            ledger.iter().map(|inv| (inv.month, inv.year)).collect();

        let mut projections = Vec::new();
        let mut period = BillingPeriod::from_date(today).next();

        for _ in 0..horizon_months {
            if let Some(end) = window_end {
                if period.first_day() >= end {
                    break;
                }
            }

            if !issued.contains(&(period.month, period.year)) {
                projections.push(ProjectedInvoice {
                    month: period.month,
                    year: period.year,
                    amount: resolved.monthly_amount,
                    is_advance: true,
                });
            }

            period = period.next();
        }

        Ok(projections)
    }

    /// Rewrite issued unpaid invoices whose amount no longer matches what
    /// a sync of their period would produce. The expected total carries the
    /// admission portion on the earliest-issued invoice, same as the
    /// synchronizer, so a read-path projection never undoes the folding.
    /// Admission-sentinel invoices are exempt; paid invoices are closed
    /// facts and untouchable.
    async fn heal_stale_invoices(
        &self,
        student_id: i64,
        ledger: &[MonthlyInvoice],
        resolved: &ResolvedFee,
    ) -> Result<()> {
        let mut healed = 0usize;

        for invoice in ledger {
            if invoice.is_paid() || invoice.is_admission() {
                continue;
            }

            let expected = if admission_applies(ledger, Some(invoice.id)) {
                resolved.monthly_amount + resolved.admission_amount
            } else {
                resolved.monthly_amount
            };
            if invoice.amount == expected && invoice.plan_id == resolved.plan_id {
                continue;
            }

            let written = self
                .invoices
                .update_unpaid(invoice.id, expected, resolved.plan_id)
                .await?;

            if written {
                info!(
                    student_id,
                    period = %invoice.period(),
                    old_amount = %invoice.amount,
                    new_amount = %expected,
                    "Self-healed stale unpaid invoice"
                );
                healed += 1;
            }
        }

        if healed > 0 {
            self.stale_view.billing_changed(student_id).await;
        }

        Ok(())
    }
}

/// End of the billable window for a batch: the earliest of the explicit
/// batch end date and the course-duration bound (start + duration, rounded
/// up to the first of the following month).
fn enrollment_window_end(batch: &Batch) -> Option<NaiveDate> {
    let duration_end = batch
        .course()
        .and_then(|c| c.duration_months)
        .map(|months| normalize_to_month_start(batch.start_date + Months::new(months)));

    match (batch.end_date, duration_end) {
        (Some(explicit), Some(derived)) => Some(explicit.min(derived)),
        (explicit, derived) => explicit.or(derived),
    }
}
