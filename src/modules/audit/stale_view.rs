// "Billing view stale" notification emitted after any ledger write so the
// presentation layer can refresh cached displays. Opaque to the engine.

use async_trait::async_trait;

#[async_trait]
pub trait StaleViewSignal: Send + Sync {
    async fn billing_changed(&self, student_id: i64);
}

/// Default signal: a tracing event the host framework's cache layer tails.
pub struct LogStaleViewSignal;

#[async_trait]
impl StaleViewSignal for LogStaleViewSignal {
    async fn billing_changed(&self, student_id: i64) {
        tracing::debug!(student_id = student_id, "Billing view invalidated");
    }
}
