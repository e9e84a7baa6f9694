// Read side of the student/enrollment/plan data owned by the admissions
// and academic-structure subsystems. The billing engine only ever reads
// this data, and always as one snapshot per synchronization.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::students::models::{
    Batch, Course, Department, Enrollment, FeeSchedule, FeeTier, Mode, Plan, Student,
};

/// Everything fee resolution needs to know about one student, read
/// together so the create/update decision is made from a single
/// consistent view.
#[derive(Debug, Clone)]
pub struct StudentBillingContext {
    pub student: Student,
    /// Most recent enrollment by `joined_at`, with its hierarchy chain.
    pub latest_enrollment: Option<Enrollment>,
    /// Plan from the open-ended plan history row, if any.
    pub active_plan: Option<Plan>,
}

#[async_trait]
pub trait StudentDirectory: Send + Sync {
    /// Load a student with their latest enrollment and active plan.
    /// Returns `None` for an unknown id.
    async fn find_with_billing_context(&self, student_id: i64)
        -> Result<Option<StudentBillingContext>>;

    /// Ids of all students with `active = true`, for bulk generation.
    async fn list_active_student_ids(&self) -> Result<Vec<i64>>;
}

/// MySQL-backed directory over the platform's relational schema.
pub struct MySqlStudentDirectory {
    pool: MySqlPool,
}

impl MySqlStudentDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn find_student(&self, student_id: i64) -> Result<Option<Student>> {
        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            SELECT id, name, mode, fee_tier, active
            FROM students
            WHERE id = ?
            "#,
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(StudentRow::into_student).transpose()
    }

    async fn find_latest_enrollment(&self, student_id: i64) -> Result<Option<Enrollment>> {
        let row = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            SELECT
                e.id AS enrollment_id, e.student_id, e.joined_at,
                b.id AS batch_id, b.name AS batch_name,
                b.start_date AS batch_start, b.end_date AS batch_end,
                b.monthly_fee AS b_monthly, b.monthly_fee_offline AS b_monthly_off,
                b.sadka_fee AS b_sadka, b.sadka_fee_offline AS b_sadka_off,
                b.admission_fee AS b_admission, b.admission_fee_offline AS b_admission_off,
                d.id AS department_id, d.name AS department_name,
                d.monthly_fee AS d_monthly, d.monthly_fee_offline AS d_monthly_off,
                d.sadka_fee AS d_sadka, d.sadka_fee_offline AS d_sadka_off,
                d.admission_fee AS d_admission, d.admission_fee_offline AS d_admission_off,
                c.id AS course_id, c.name AS course_name, c.duration_months,
                c.monthly_fee AS c_monthly, c.monthly_fee_offline AS c_monthly_off,
                c.sadka_fee AS c_sadka, c.sadka_fee_offline AS c_sadka_off,
                c.admission_fee AS c_admission, c.admission_fee_offline AS c_admission_off
            FROM enrollments e
            JOIN batches b ON b.id = e.batch_id
            LEFT JOIN departments d ON d.id = b.department_id
            LEFT JOIN courses c ON c.id = d.course_id
            WHERE e.student_id = ?
            ORDER BY e.joined_at DESC
            LIMIT 1
            "#,
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(EnrollmentRow::into_enrollment))
    }

    async fn find_active_plan(&self, student_id: i64) -> Result<Option<Plan>> {
        let row = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT p.id, p.name, p.monthly_fee
            FROM plan_history ph
            JOIN plans p ON p.id = ph.plan_id
            WHERE ph.student_id = ? AND ph.end_date IS NULL
            ORDER BY ph.start_date DESC
            LIMIT 1
            "#,
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Plan {
            id: r.id,
            name: r.name,
            monthly_fee: r.monthly_fee,
        }))
    }
}

#[async_trait]
impl StudentDirectory for MySqlStudentDirectory {
    async fn find_with_billing_context(
        &self,
        student_id: i64,
    ) -> Result<Option<StudentBillingContext>> {
        let Some(student) = self.find_student(student_id).await? else {
            return Ok(None);
        };

        let latest_enrollment = self.find_latest_enrollment(student_id).await?;
        let active_plan = self.find_active_plan(student_id).await?;

        Ok(Some(StudentBillingContext {
            student,
            latest_enrollment,
            active_plan,
        }))
    }

    async fn list_active_student_ids(&self) -> Result<Vec<i64>> {
        let ids: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT id FROM students
            WHERE active = TRUE
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}

// Helper structs for database mapping

#[derive(Debug, sqlx::FromRow)]
struct StudentRow {
    id: i64,
    name: String,
    mode: String,
    fee_tier: String,
    active: bool,
}

impl StudentRow {
    fn into_student(self) -> Result<Student> {
        let mode = Mode::from_str(&self.mode)
            .map_err(|e| AppError::Internal(format!("Invalid mode in database: {}", e)))?;
        let fee_tier = FeeTier::from_str(&self.fee_tier)
            .map_err(|e| AppError::Internal(format!("Invalid fee tier in database: {}", e)))?;

        Ok(Student {
            id: self.id,
            name: self.name,
            mode,
            fee_tier,
            active: self.active,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: i64,
    name: String,
    monthly_fee: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct EnrollmentRow {
    enrollment_id: i64,
    student_id: i64,
    joined_at: DateTime<Utc>,

    batch_id: i64,
    batch_name: String,
    batch_start: NaiveDate,
    batch_end: Option<NaiveDate>,
    b_monthly: Option<Decimal>,
    b_monthly_off: Option<Decimal>,
    b_sadka: Option<Decimal>,
    b_sadka_off: Option<Decimal>,
    b_admission: Option<Decimal>,
    b_admission_off: Option<Decimal>,

    department_id: Option<i64>,
    department_name: Option<String>,
    d_monthly: Option<Decimal>,
    d_monthly_off: Option<Decimal>,
    d_sadka: Option<Decimal>,
    d_sadka_off: Option<Decimal>,
    d_admission: Option<Decimal>,
    d_admission_off: Option<Decimal>,

    course_id: Option<i64>,
    course_name: Option<String>,
    duration_months: Option<u32>,
    c_monthly: Option<Decimal>,
    c_monthly_off: Option<Decimal>,
    c_sadka: Option<Decimal>,
    c_sadka_off: Option<Decimal>,
    c_admission: Option<Decimal>,
    c_admission_off: Option<Decimal>,
}

impl EnrollmentRow {
    fn into_enrollment(self) -> Enrollment {
        // A dropped department or course leaves a gap in the chain; the
        // resolver then runs out of levels and resolves to zero.
        let course = self.course_id.map(|id| Course {
            id,
            name: self.course_name.unwrap_or_default(),
            duration_months: self.duration_months,
            fees: FeeSchedule {
                monthly_online: self.c_monthly,
                monthly_offline: self.c_monthly_off,
                sadka_online: self.c_sadka,
                sadka_offline: self.c_sadka_off,
                admission_online: self.c_admission,
                admission_offline: self.c_admission_off,
            },
        });

        let department = self.department_id.map(|id| Department {
            id,
            name: self.department_name.unwrap_or_default(),
            fees: FeeSchedule {
                monthly_online: self.d_monthly,
                monthly_offline: self.d_monthly_off,
                sadka_online: self.d_sadka,
                sadka_offline: self.d_sadka_off,
                admission_online: self.d_admission,
                admission_offline: self.d_admission_off,
            },
            course,
        });

        Enrollment {
            id: self.enrollment_id,
            student_id: self.student_id,
            joined_at: self.joined_at,
            batch: Batch {
                id: self.batch_id,
                name: self.batch_name,
                start_date: self.batch_start,
                end_date: self.batch_end,
                fees: FeeSchedule {
                    monthly_online: self.b_monthly,
                    monthly_offline: self.b_monthly_off,
                    sadka_online: self.b_sadka,
                    sadka_offline: self.b_sadka_off,
                    admission_online: self.b_admission,
                    admission_offline: self.b_admission_off,
                },
                department,
            },
        }
    }
}
