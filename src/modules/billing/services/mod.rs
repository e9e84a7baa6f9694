pub mod advance_projector;
pub mod bulk_generator;
pub mod fee_resolver;
pub mod invoice_synchronizer;

pub use advance_projector::AdvanceProjector;
pub use bulk_generator::BulkGenerator;
pub use fee_resolver::{FeeResolver, ResolvedFee};
pub use invoice_synchronizer::InvoiceSynchronizer;
