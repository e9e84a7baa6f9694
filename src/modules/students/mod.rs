// Students module

pub mod models;
pub mod repositories;

pub use models::{Enrollment, FeeTier, Mode, Plan, Student};
pub use repositories::{StudentBillingContext, StudentDirectory};
