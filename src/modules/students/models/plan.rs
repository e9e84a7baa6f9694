use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A named flat monthly fee, independent of the academic hierarchy.
/// An active plan replaces the hierarchy-derived monthly fee entirely;
/// it never defines an admission fee. The plan_history table keeps the
/// assignment timeline; the directory only surfaces the active row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: i64,
    pub name: String,
    pub monthly_fee: Decimal,
}
