// In-memory doubles for the engine's storage collaborators, plus fixture
// builders. The invoice store mirrors the production unique-key semantics
// so idempotency and duplicate-writer behavior can be exercised without a
// database.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use feeledger::core::{AppError, Result};
use feeledger::modules::audit::{AuditSink, StaleViewSignal};
use feeledger::modules::billing::models::{InvoiceStatus, MonthlyInvoice, NewInvoice};
use feeledger::modules::billing::repositories::{InsertOutcome, InvoiceStore};
use feeledger::modules::students::models::{
    Batch, Course, Department, Enrollment, FeeSchedule, FeeTier, Mode, Plan, Student,
};
use feeledger::modules::students::repositories::{StudentBillingContext, StudentDirectory};

// ---------------------------------------------------------------------------
// Student directory double

#[derive(Default)]
pub struct InMemoryDirectory {
    contexts: Mutex<HashMap<i64, StudentBillingContext>>,
    /// Student ids whose lookup fails with an internal error, for
    /// exercising bulk-run error isolation.
    failing: Mutex<Vec<i64>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, context: StudentBillingContext) {
        self.contexts
            .lock()
            .unwrap()
            .insert(context.student.id, context);
    }

    pub fn fail_for(&self, student_id: i64) {
        self.failing.lock().unwrap().push(student_id);
    }

    /// Mutate a stored context in place, e.g. to migrate a tier.
    pub fn update<F: FnOnce(&mut StudentBillingContext)>(&self, student_id: i64, f: F) {
        let mut contexts = self.contexts.lock().unwrap();
        f(contexts.get_mut(&student_id).expect("unknown student"));
    }
}

#[async_trait]
impl StudentDirectory for InMemoryDirectory {
    async fn find_with_billing_context(
        &self,
        student_id: i64,
    ) -> Result<Option<StudentBillingContext>> {
        if self.failing.lock().unwrap().contains(&student_id) {
            return Err(AppError::internal("simulated directory failure"));
        }
        Ok(self.contexts.lock().unwrap().get(&student_id).cloned())
    }

    async fn list_active_student_ids(&self) -> Result<Vec<i64>> {
        let mut ids: Vec<i64> = self
            .contexts
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.student.active)
            .map(|c| c.student.id)
            .collect();
        ids.extend(self.failing.lock().unwrap().iter());
        ids.sort_unstable();
        Ok(ids)
    }
}

// ---------------------------------------------------------------------------
// Invoice store double

#[derive(Default)]
pub struct InMemoryInvoiceStore {
    invoices: Mutex<Vec<MonthlyInvoice>>,
    next_id: AtomicUsize,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self {
            invoices: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
        }
    }

    pub fn all(&self) -> Vec<MonthlyInvoice> {
        self.invoices.lock().unwrap().clone()
    }

    /// Seed an invoice directly, bypassing the synchronizer.
    pub fn seed(&self, invoice: MonthlyInvoice) {
        self.invoices.lock().unwrap().push(invoice);
    }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn find(
        &self,
        student_id: i64,
        month: u32,
        year: i32,
    ) -> Result<Option<MonthlyInvoice>> {
        Ok(self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.student_id == student_id && i.month == month && i.year == year)
            .cloned())
    }

    async fn insert(&self, invoice: NewInvoice) -> Result<InsertOutcome> {
        let mut invoices = self.invoices.lock().unwrap();

        let duplicate = invoices.iter().any(|i| {
            i.student_id == invoice.student_id
                && i.month == invoice.month
                && i.year == invoice.year
        });
        if duplicate {
            return Ok(InsertOutcome::DuplicateKey);
        }

        let stored = MonthlyInvoice {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) as i64,
            student_id: invoice.student_id,
            month: invoice.month,
            year: invoice.year,
            amount: invoice.amount,
            status: InvoiceStatus::Unpaid,
            plan_id: invoice.plan_id,
            due_date: invoice.due_date,
            issued_at: Utc::now(),
        };
        invoices.push(stored.clone());

        Ok(InsertOutcome::Inserted(stored))
    }

    async fn update_unpaid(
        &self,
        id: i64,
        amount: Decimal,
        plan_id: Option<i64>,
    ) -> Result<bool> {
        let mut invoices = self.invoices.lock().unwrap();
        match invoices
            .iter_mut()
            .find(|i| i.id == id && i.status == InvoiceStatus::Unpaid)
        {
            Some(invoice) => {
                invoice.amount = amount;
                invoice.plan_id = plan_id;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_for_student(&self, student_id: i64) -> Result<Vec<MonthlyInvoice>> {
        let mut ledger: Vec<MonthlyInvoice> = self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.student_id == student_id)
            .cloned()
            .collect();
        ledger.sort_by_key(|i| (i.year, i.month));
        Ok(ledger)
    }

    async fn mark_paid(&self, id: i64) -> Result<bool> {
        let mut invoices = self.invoices.lock().unwrap();
        match invoices
            .iter_mut()
            .find(|i| i.id == id && i.status == InvoiceStatus::Unpaid)
        {
            Some(invoice) => {
                invoice.status = InvoiceStatus::Paid;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Audit and invalidation doubles

#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub action: String,
    pub target_model: String,
    pub target_id: i64,
    pub details: Value,
}

#[derive(Default)]
pub struct RecordingAuditSink {
    pub records: Mutex<Vec<AuditRecord>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn log_action(&self, action: &str, target_model: &str, target_id: i64, details: Value) {
        self.records.lock().unwrap().push(AuditRecord {
            action: action.to_string(),
            target_model: target_model.to_string(),
            target_id,
            details,
        });
    }
}

#[derive(Default)]
pub struct CountingStaleSignal {
    pub notifications: AtomicUsize,
}

impl CountingStaleSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.notifications.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StaleViewSignal for CountingStaleSignal {
    async fn billing_changed(&self, _student_id: i64) {
        self.notifications.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Fixture builders

pub fn student(id: i64, mode: Mode, tier: FeeTier) -> Student {
    Student {
        id,
        name: format!("Student {}", id),
        mode,
        fee_tier: tier,
        active: true,
    }
}

pub fn batch_fees(monthly_offline: Option<Decimal>, admission_offline: Option<Decimal>) -> FeeSchedule {
    FeeSchedule {
        monthly_offline,
        admission_offline,
        ..FeeSchedule::default()
    }
}

pub fn course(id: i64, duration_months: Option<u32>, fees: FeeSchedule) -> Course {
    Course {
        id,
        name: format!("Course {}", id),
        duration_months,
        fees,
    }
}

pub fn department(id: i64, fees: FeeSchedule, course: Option<Course>) -> Department {
    Department {
        id,
        name: format!("Department {}", id),
        fees,
        course,
    }
}

pub fn batch(id: i64, start: NaiveDate, fees: FeeSchedule, department: Option<Department>) -> Batch {
    Batch {
        id,
        name: format!("Batch {}", id),
        start_date: start,
        end_date: None,
        fees,
        department,
    }
}

pub fn enrollment(student_id: i64, batch: Batch) -> Enrollment {
    Enrollment {
        id: student_id * 100,
        student_id,
        batch,
        joined_at: Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap(),
    }
}

pub fn plan(id: i64, monthly_fee: Decimal) -> Plan {
    Plan {
        id,
        name: format!("Plan {}", id),
        monthly_fee,
    }
}

pub fn context(
    student: Student,
    enrollment: Option<Enrollment>,
    plan: Option<Plan>,
) -> StudentBillingContext {
    StudentBillingContext {
        student,
        latest_enrollment: enrollment,
        active_plan: plan,
    }
}

/// Context for the common test shape: offline general student in a batch
/// with a flat monthly and admission fee configured at batch level.
pub fn offline_batch_context(
    student_id: i64,
    monthly: Decimal,
    admission: Decimal,
) -> StudentBillingContext {
    let b = batch(
        student_id * 10,
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        batch_fees(Some(monthly), Some(admission)),
        None,
    );
    context(
        student(student_id, Mode::Offline, FeeTier::General),
        Some(enrollment(student_id, b)),
        None,
    )
}
