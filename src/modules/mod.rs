pub mod audit;
pub mod billing;
pub mod students;
