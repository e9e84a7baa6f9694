// Invoice ledger storage.
//
// The (student_id, month, year) unique key is the real arbiter for
// concurrent duplicate syncs: the second writer's insert is absorbed as
// `DuplicateKey`, never surfaced as an error. Paid invoices are shielded
// at the SQL level with `AND status = 'unpaid'` so no write path can
// mutate a closed invoice even by accident.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::billing::models::{InvoiceStatus, MonthlyInvoice, NewInvoice};

/// Result of an insert attempt against the unique period key.
#[derive(Debug)]
pub enum InsertOutcome {
    Inserted(MonthlyInvoice),
    /// Another writer issued the period's invoice first. Benign race.
    DuplicateKey,
}

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Look up the canonical invoice for one student and period.
    async fn find(&self, student_id: i64, month: u32, year: i32)
        -> Result<Option<MonthlyInvoice>>;

    /// Insert a new unpaid invoice, deferring duplicate arbitration to the
    /// storage-level unique key.
    async fn insert(&self, invoice: NewInvoice) -> Result<InsertOutcome>;

    /// Rewrite amount and plan of an invoice, only if it is still unpaid.
    /// Returns false when nothing was written (paid or missing target).
    async fn update_unpaid(&self, id: i64, amount: Decimal, plan_id: Option<i64>)
        -> Result<bool>;

    /// Full ledger for one student, ordered by period.
    async fn list_for_student(&self, student_id: i64) -> Result<Vec<MonthlyInvoice>>;

    /// Flip an invoice to paid. Called by the payment collaborator, never
    /// by the engine itself.
    async fn mark_paid(&self, id: i64) -> Result<bool>;
}

/// MySQL-backed ledger store.
pub struct MySqlInvoiceStore {
    pool: MySqlPool,
}

impl MySqlInvoiceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvoiceStore for MySqlInvoiceStore {
    async fn find(
        &self,
        student_id: i64,
        month: u32,
        year: i32,
    ) -> Result<Option<MonthlyInvoice>> {
        let row = sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT id, student_id, month, year, amount, status, plan_id, due_date, issued_at
            FROM monthly_invoices
            WHERE student_id = ? AND month = ? AND year = ?
            "#,
        )
        .bind(student_id)
        .bind(month)
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;

        row.map(InvoiceRow::into_invoice).transpose()
    }

    async fn insert(&self, invoice: NewInvoice) -> Result<InsertOutcome> {
        let issued_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO monthly_invoices
                (student_id, month, year, amount, status, plan_id, due_date, issued_at)
            VALUES (?, ?, ?, ?, 'unpaid', ?, ?, ?)
            "#,
        )
        .bind(invoice.student_id)
        .bind(invoice.month)
        .bind(invoice.year)
        .bind(invoice.amount)
        .bind(invoice.plan_id)
        .bind(invoice.due_date)
        .bind(issued_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(InsertOutcome::Inserted(MonthlyInvoice {
                id: done.last_insert_id() as i64,
                student_id: invoice.student_id,
                month: invoice.month,
                year: invoice.year,
                amount: invoice.amount,
                status: InvoiceStatus::Unpaid,
                plan_id: invoice.plan_id,
                due_date: invoice.due_date,
                issued_at,
            })),
            Err(e) => {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() {
                        return Ok(InsertOutcome::DuplicateKey);
                    }
                }
                Err(AppError::Database(e))
            }
        }
    }

    async fn update_unpaid(
        &self,
        id: i64,
        amount: Decimal,
        plan_id: Option<i64>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE monthly_invoices
            SET amount = ?, plan_id = ?
            WHERE id = ? AND status = 'unpaid'
            "#,
        )
        .bind(amount)
        .bind(plan_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_student(&self, student_id: i64) -> Result<Vec<MonthlyInvoice>> {
        let rows = sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT id, student_id, month, year, amount, status, plan_id, due_date, issued_at
            FROM monthly_invoices
            WHERE student_id = ?
            ORDER BY year, month
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(InvoiceRow::into_invoice).collect()
    }

    async fn mark_paid(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE monthly_invoices
            SET status = 'paid'
            WHERE id = ? AND status = 'unpaid'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

// Helper struct for database mapping

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: i64,
    student_id: i64,
    month: u32,
    year: i32,
    amount: Decimal,
    status: String,
    plan_id: Option<i64>,
    due_date: NaiveDate,
    issued_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_invoice(self) -> Result<MonthlyInvoice> {
        let status = InvoiceStatus::from_str(&self.status)
            .map_err(|e| AppError::Internal(format!("Invalid status in database: {}", e)))?;

        Ok(MonthlyInvoice {
            id: self.id,
            student_id: self.student_id,
            month: self.month,
            year: self.year,
            amount: self.amount,
            status,
            plan_id: self.plan_id,
            due_date: self.due_date,
            issued_at: self.issued_at,
        })
    }
}
