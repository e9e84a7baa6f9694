pub mod enrollment;
pub mod hierarchy;
pub mod plan;
pub mod student;

pub use enrollment::Enrollment;
pub use hierarchy::{Batch, Course, Department, FeeSchedule};
pub use plan::Plan;
pub use student::{FeeTier, Mode, Student};
