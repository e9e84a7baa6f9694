pub mod student_directory;

pub use student_directory::{MySqlStudentDirectory, StudentBillingContext, StudentDirectory};
