//! Fee resolution and invoice reconciliation engine.
//!
//! Determines what each student owes per billing period by walking the
//! fee-override hierarchy, and keeps the per-student invoice ledger
//! consistent as enrollment, tier and plan data change over time.

pub mod config;
pub mod core;
pub mod modules;

// Re-export commonly used types
pub use modules::audit;
pub use modules::billing;
pub use modules::students;
