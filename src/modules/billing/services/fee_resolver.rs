// Pure fee resolution.
//
// Determines what a student owes per month and on admission from their
// mode, tier, latest enrollment and active plan. No side effects and no
// caching: the engine re-runs resolution whenever tier, mode, enrollment
// or plan changes, and only trusts a stored amount once an invoice is paid.

use rust_decimal::Decimal;

use crate::modules::students::models::{Enrollment, Plan, Student};

/// Result of one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFee {
    pub monthly_amount: Decimal,
    pub admission_amount: Decimal,
    /// Set when the monthly amount came from a plan rather than the
    /// hierarchy; recorded on the invoice.
    pub plan_id: Option<i64>,
}

/// FeeResolver walks the Batch -> Department -> Course override chain.
pub struct FeeResolver;

impl FeeResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve both amounts for a student.
    ///
    /// An active plan replaces the hierarchy-derived monthly fee entirely;
    /// the admission fee is always hierarchy-derived regardless of plan.
    /// A student with neither plan nor enrollment owes nothing, as does a
    /// student whose hierarchy configures no fee at any level: absence is
    /// a designed "nothing due" default, not an error.
    pub fn resolve(
        &self,
        student: &Student,
        enrollment: Option<&Enrollment>,
        active_plan: Option<&Plan>,
    ) -> ResolvedFee {
        let monthly_amount = match active_plan {
            Some(plan) => plan.monthly_fee,
            None => enrollment
                .map(|e| self.hierarchy_monthly(student, e))
                .unwrap_or(Decimal::ZERO),
        };

        let admission_amount = enrollment
            .map(|e| self.hierarchy_admission(student, e))
            .unwrap_or(Decimal::ZERO);

        ResolvedFee {
            monthly_amount,
            admission_amount,
            plan_id: active_plan.map(|p| p.id),
        }
    }

    /// Monthly fee from the hierarchy for the (mode, tier) cell.
    pub fn hierarchy_monthly(&self, student: &Student, enrollment: &Enrollment) -> Decimal {
        let batch = &enrollment.batch;
        let department = batch.department.as_ref();
        let course = batch.course();

        first_configured([
            batch.fees.monthly(student.mode, student.fee_tier),
            department.and_then(|d| d.fees.monthly(student.mode, student.fee_tier)),
            course.and_then(|c| c.fees.monthly(student.mode, student.fee_tier)),
        ])
    }

    /// Admission fee from the hierarchy. Tier-independent.
    pub fn hierarchy_admission(&self, student: &Student, enrollment: &Enrollment) -> Decimal {
        let batch = &enrollment.batch;
        let department = batch.department.as_ref();
        let course = batch.course();

        first_configured([
            batch.fees.admission(student.mode),
            department.and_then(|d| d.fees.admission(student.mode)),
            course.and_then(|c| c.fees.admission(student.mode)),
        ])
    }
}

impl Default for FeeResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// First configured value wins, in hierarchy order; nothing configured
/// resolves to zero.
fn first_configured(levels: [Option<Decimal>; 3]) -> Decimal {
    levels.into_iter().flatten().next().unwrap_or(Decimal::ZERO)
}
