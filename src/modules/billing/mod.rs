// Billing module: fee resolution and invoice reconciliation

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{BulkSummary, InvoiceStatus, MonthlyInvoice, ProjectedInvoice, SyncOutcome,
    SyncReport};
pub use repositories::{InsertOutcome, InvoiceStore};
pub use services::{AdvanceProjector, BulkGenerator, FeeResolver, InvoiceSynchronizer};
