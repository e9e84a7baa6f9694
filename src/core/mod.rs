pub mod error;
pub mod period;

pub use error::{AppError, Result};
pub use period::BillingPeriod;
