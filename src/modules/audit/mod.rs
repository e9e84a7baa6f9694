// Audit module

pub mod sink;
pub mod stale_view;

pub use sink::{AuditSink, MySqlAuditSink};
pub use stale_view::{LogStaleViewSignal, StaleViewSignal};
