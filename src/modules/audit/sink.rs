// Fire-and-forget audit sink. A failing sink must never fail the billing
// operation that triggered it; storage errors are downgraded to warnings.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::MySqlPool;
use tracing::warn;

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn log_action(&self, action: &str, target_model: &str, target_id: i64, details: Value);
}

/// Writes audit records to the platform's `audit_logs` table, mirroring
/// each record to the tracing log.
pub struct MySqlAuditSink {
    pool: MySqlPool,
}

impl MySqlAuditSink {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for MySqlAuditSink {
    async fn log_action(&self, action: &str, target_model: &str, target_id: i64, details: Value) {
        tracing::info!(
            action = action,
            target_model = target_model,
            target_id = target_id,
            details = %details,
            "audit"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO audit_logs (action, target_model, target_id, details, created_at)
            VALUES (?, ?, ?, ?, NOW())
            "#,
        )
        .bind(action)
        .bind(target_model)
        .bind(target_id)
        .bind(details.to_string())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(error = %e, action = action, "Audit sink write failed; record dropped");
        }
    }
}
