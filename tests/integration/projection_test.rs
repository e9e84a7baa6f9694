// Advance projection: bounded by the enrollment window and the issued
// ledger, always live-resolved, and self-healing stale unpaid invoices as
// a side effect.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use feeledger::core::{AppError, BillingPeriod};
use feeledger::modules::billing::models::{InvoiceStatus, MonthlyInvoice, SyncOutcome};
use feeledger::modules::billing::services::{AdvanceProjector, InvoiceSynchronizer};
use feeledger::modules::students::models::{FeeSchedule, FeeTier, Mode};

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::{
    batch, batch_fees, context, course, department, enrollment, offline_batch_context, plan,
    student, CountingStaleSignal, InMemoryDirectory, InMemoryInvoiceStore,
};

struct Harness {
    directory: Arc<InMemoryDirectory>,
    store: Arc<InMemoryInvoiceStore>,
    signal: Arc<CountingStaleSignal>,
    projector: AdvanceProjector,
    sync: InvoiceSynchronizer,
}

fn harness() -> Harness {
    let directory = Arc::new(InMemoryDirectory::new());
    let store = Arc::new(InMemoryInvoiceStore::new());
    let signal = Arc::new(CountingStaleSignal::new());
    let projector = AdvanceProjector::new(directory.clone(), store.clone(), signal.clone(), 12);
    let sync = InvoiceSynchronizer::new(directory.clone(), store.clone(), signal.clone(), 10);
    Harness {
        directory,
        store,
        signal,
        projector,
        sync,
    }
}

/// Register an offline general student in a six-month batch starting
/// Jan 1 2026 with the given batch-level fees. Window end: Jul 1 2026.
fn put_six_month_student_with_fees(h: &Harness, student_id: i64, fees: FeeSchedule) {
    let c = course(3, Some(6), Default::default());
    let d = department(2, Default::default(), Some(c));
    let b = batch(
        student_id * 10,
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        fees,
        Some(d),
    );
    h.directory.put(context(
        student(student_id, Mode::Offline, FeeTier::General),
        Some(enrollment(student_id, b)),
        None,
    ));
}

fn put_six_month_student(h: &Harness, student_id: i64, monthly: Decimal) {
    put_six_month_student_with_fees(h, student_id, batch_fees(Some(monthly), None));
}

fn mid_march() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
}

#[tokio::test]
async fn projects_only_until_the_course_duration_boundary() {
    let h = harness();
    put_six_month_student(&h, 1, dec!(1000));

    let projections = h.projector.project_from(1, mid_march(), 12).await.unwrap();

    let periods: Vec<(u32, i32)> = projections.iter().map(|p| (p.month, p.year)).collect();
    assert_eq!(periods, vec![(4, 2026), (5, 2026), (6, 2026)]);
    assert!(projections.iter().all(|p| p.amount == dec!(1000)));
    assert!(projections.iter().all(|p| p.is_advance));
}

#[tokio::test]
async fn explicit_batch_end_date_caps_the_window_when_stricter() {
    let h = harness();
    put_six_month_student(&h, 1, dec!(1000));
    h.directory.update(1, |ctx| {
        ctx.latest_enrollment.as_mut().unwrap().batch.end_date =
            Some(NaiveDate::from_ymd_opt(2026, 5, 1).unwrap());
    });

    let projections = h.projector.project_from(1, mid_march(), 12).await.unwrap();

    let periods: Vec<(u32, i32)> = projections.iter().map(|p| (p.month, p.year)).collect();
    assert_eq!(periods, vec![(4, 2026)]);
}

#[tokio::test]
async fn already_issued_periods_are_never_projected() {
    let h = harness();
    put_six_month_student(&h, 1, dec!(1000));

    h.sync
        .sync_invoice(1, BillingPeriod::new(4, 2026))
        .await
        .unwrap();

    let projections = h.projector.project_from(1, mid_march(), 12).await.unwrap();

    let periods: Vec<(u32, i32)> = projections.iter().map(|p| (p.month, p.year)).collect();
    assert_eq!(periods, vec![(5, 2026), (6, 2026)]);
}

#[tokio::test]
async fn horizon_bounds_projection_without_an_enrollment_end() {
    let h = harness();
    // No course duration and no batch end date: only the horizon limits.
    h.directory.put(offline_batch_context(1, dec!(750), Decimal::ZERO));

    let projections = h.projector.project_from(1, mid_march(), 5).await.unwrap();

    assert_eq!(projections.len(), 5);
    assert_eq!(
        (projections[0].month, projections[0].year),
        (4, 2026)
    );
    assert_eq!(
        (projections[4].month, projections[4].year),
        (8, 2026)
    );
}

#[tokio::test]
async fn zero_monthly_fee_projects_nothing() {
    let h = harness();
    put_six_month_student(&h, 1, Decimal::ZERO);

    let projections = h.projector.project_from(1, mid_march(), 12).await.unwrap();

    assert!(projections.is_empty());
}

#[tokio::test]
async fn projections_reflect_a_live_plan_override() {
    let h = harness();
    put_six_month_student(&h, 1, dec!(1000));
    h.directory.update(1, |ctx| {
        ctx.active_plan = Some(plan(7, dec!(650)));
    });

    let projections = h.projector.project_from(1, mid_march(), 12).await.unwrap();

    assert!(!projections.is_empty());
    assert!(projections.iter().all(|p| p.amount == dec!(650)));
}

#[tokio::test]
async fn stale_unpaid_invoices_are_healed_during_projection() {
    let h = harness();
    put_six_month_student(&h, 1, dec!(1000));

    // Issued back when the monthly fee was lower.
    h.store.seed(MonthlyInvoice {
        id: 1,
        student_id: 1,
        month: 2,
        year: 2026,
        amount: dec!(800),
        status: InvoiceStatus::Unpaid,
        plan_id: None,
        due_date: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
        issued_at: chrono::Utc::now(),
    });

    h.projector.project_from(1, mid_march(), 12).await.unwrap();

    let ledger = h.store.all();
    assert_eq!(ledger[0].amount, dec!(1000));
    assert_eq!(h.signal.count(), 1);
}

#[tokio::test]
async fn paid_and_admission_invoices_are_exempt_from_healing() {
    let h = harness();
    put_six_month_student(&h, 1, dec!(1000));

    h.store.seed(MonthlyInvoice {
        id: 1,
        student_id: 1,
        month: BillingPeriod::ADMISSION_MONTH,
        year: 2026,
        amount: dec!(500),
        status: InvoiceStatus::Unpaid,
        plan_id: None,
        due_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
        issued_at: chrono::Utc::now(),
    });
    h.store.seed(MonthlyInvoice {
        id: 2,
        student_id: 1,
        month: 2,
        year: 2026,
        amount: dec!(800),
        status: InvoiceStatus::Paid,
        plan_id: None,
        due_date: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
        issued_at: chrono::Utc::now(),
    });

    h.projector.project_from(1, mid_march(), 12).await.unwrap();

    let ledger = h.store.all();
    assert_eq!(ledger[0].amount, dec!(500), "admission sentinel untouched");
    assert_eq!(ledger[1].amount, dec!(800), "paid invoice untouched");
    assert_eq!(h.signal.count(), 0);
}

#[tokio::test]
async fn projection_leaves_a_freshly_synced_first_invoice_untouched() {
    let h = harness();
    put_six_month_student_with_fees(&h, 1, batch_fees(Some(dec!(1000)), Some(dec!(500))));

    // First sync folds the admission fee into the invoice.
    h.sync
        .sync_invoice(1, BillingPeriod::new(3, 2026))
        .await
        .unwrap();

    let projections = h.projector.project_from(1, mid_march(), 12).await.unwrap();

    // Nothing changed between sync and projection, so the ledger must not
    // be rewritten: the first invoice keeps its admission portion and only
    // future months are shown monthly-only.
    assert_eq!(h.store.all()[0].amount, dec!(1500));
    assert!(projections.iter().all(|p| p.amount == dec!(1000)));
    assert_eq!(h.signal.count(), 1, "only the initial create signalled");

    let resync = h
        .sync
        .sync_invoice(1, BillingPeriod::new(3, 2026))
        .await
        .unwrap();
    assert_eq!(resync.outcome, SyncOutcome::AlreadyExisted);
}

#[tokio::test]
async fn healing_keeps_the_admission_portion_on_the_first_invoice() {
    let h = harness();
    put_six_month_student_with_fees(&h, 1, batch_fees(Some(dec!(1000)), Some(dec!(500))));

    h.sync
        .sync_invoice(1, BillingPeriod::new(3, 2026))
        .await
        .unwrap();
    h.sync
        .sync_invoice(1, BillingPeriod::new(4, 2026))
        .await
        .unwrap();

    h.directory.update(1, |ctx| {
        let batch = &mut ctx.latest_enrollment.as_mut().unwrap().batch;
        batch.fees.monthly_offline = Some(dec!(1200));
    });

    h.projector.project_from(1, mid_march(), 12).await.unwrap();

    let ledger = h.store.all();
    assert_eq!(ledger[0].amount, dec!(1700), "monthly healed, admission kept");
    assert_eq!(ledger[1].amount, dec!(1200));
}

#[tokio::test]
async fn inactive_student_cannot_be_projected() {
    let h = harness();
    put_six_month_student(&h, 1, dec!(1000));
    h.directory.update(1, |ctx| ctx.student.active = false);

    let err = h.projector.project_from(1, mid_march(), 12).await.unwrap_err();

    assert!(matches!(err, AppError::StudentInactive(1)));
}
