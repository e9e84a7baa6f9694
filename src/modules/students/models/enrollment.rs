use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::hierarchy::Batch;

/// Links a student to a batch. Enrollment rows are append-only: a batch
/// transfer creates a new row, and the most recent by `joined_at` is the
/// one fee resolution trusts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub batch: Batch,
    pub joined_at: DateTime<Utc>,
}
