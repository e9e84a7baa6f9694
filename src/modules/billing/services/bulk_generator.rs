// Fans the synchronizer out over the whole active student body, on a
// schedule or a manual trigger. Each student's sync is independently
// idempotent, so an interrupted run can simply be re-run: students already
// processed come back as already-existed/no-op outcomes.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::{BillingPeriod, Result};
use crate::modules::audit::AuditSink;
use crate::modules::billing::models::BulkSummary;
use crate::modules::billing::services::invoice_synchronizer::InvoiceSynchronizer;
use crate::modules::students::repositories::StudentDirectory;

pub struct BulkGenerator {
    directory: Arc<dyn StudentDirectory>,
    synchronizer: Arc<InvoiceSynchronizer>,
    audit: Arc<dyn AuditSink>,
}

impl BulkGenerator {
    pub fn new(
        directory: Arc<dyn StudentDirectory>,
        synchronizer: Arc<InvoiceSynchronizer>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            directory,
            synchronizer,
            audit,
        }
    }

    /// Generate the current period's invoices for every active student.
    ///
    /// One student's failure never aborts the run; it is logged and
    /// counted under `errors`. Emits a single audit record per run (not
    /// one per student) when anything was created or updated.
    pub async fn generate_all(&self) -> Result<BulkSummary> {
        self.generate_for_period(BillingPeriod::current()).await
    }

    pub async fn generate_for_period(&self, period: BillingPeriod) -> Result<BulkSummary> {
        let run_id = Uuid::new_v4();
        let student_ids = self.directory.list_active_student_ids().await?;
        info!(
            %run_id,
            students = student_ids.len(),
            %period,
            "Bulk invoice generation started"
        );

        let mut summary = BulkSummary::default();

        for student_id in student_ids {
            match self.synchronizer.sync_invoice(student_id, period).await {
                Ok(report) => summary.record(report.outcome),
                Err(e) => {
                    warn!(student_id, error = %e, "Invoice sync failed; continuing run");
                    summary.record_error();
                }
            }
        }

        info!(
            %run_id,
            created = summary.created,
            updated = summary.updated,
            existed = summary.existed,
            skipped = summary.skipped,
            errors = summary.errors,
            "Bulk invoice generation finished"
        );

        if summary.changed_anything() {
            self.audit
                .log_action(
                    "bulk_invoice_generation",
                    "MonthlyInvoice",
                    0,
                    json!({
                        "run_id": run_id.to_string(),
                        "period": period.to_string(),
                        "created": summary.created,
                        "updated": summary.updated,
                        "existed": summary.existed,
                        "skipped": summary.skipped,
                        "errors": summary.errors,
                        "total": summary.total,
                    }),
                )
                .await;
        }

        Ok(summary)
    }
}
