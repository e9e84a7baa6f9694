pub mod invoice;
pub mod outcome;

pub use invoice::{InvoiceStatus, MonthlyInvoice, NewInvoice};
pub use outcome::{BulkSummary, ProjectedInvoice, SyncOutcome, SyncReport};
