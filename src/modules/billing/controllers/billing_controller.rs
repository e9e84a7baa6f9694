use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::{AppError, BillingPeriod};
use crate::modules::billing::repositories::InvoiceStore;
use crate::modules::billing::services::{AdvanceProjector, BulkGenerator, InvoiceSynchronizer};

/// Optional explicit period; defaults to the current calendar month.
#[derive(Debug, Deserialize)]
pub struct SyncQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    pub horizon: Option<u32>,
}

/// Synchronize one student's invoice for a period
/// POST /students/{id}/invoices/sync
pub async fn sync_invoice(
    service: web::Data<Arc<InvoiceSynchronizer>>,
    path: web::Path<i64>,
    query: web::Query<SyncQuery>,
) -> Result<HttpResponse, AppError> {
    let student_id = path.into_inner();

    let report = match (query.month, query.year) {
        (Some(month), Some(year)) => {
            service
                .sync_invoice(student_id, BillingPeriod::new(month, year))
                .await?
        }
        (None, None) => service.sync_current(student_id).await?,
        _ => {
            return Err(AppError::validation(
                "month and year must be provided together",
            ))
        }
    };

    Ok(HttpResponse::Ok().json(report))
}

/// Projected future dues for one student
/// GET /students/{id}/invoices/upcoming
pub async fn upcoming_invoices(
    service: web::Data<Arc<AdvanceProjector>>,
    path: web::Path<i64>,
    query: web::Query<UpcomingQuery>,
) -> Result<HttpResponse, AppError> {
    let student_id = path.into_inner();

    let projections = service.project_upcoming(student_id, query.horizon).await?;

    Ok(HttpResponse::Ok().json(projections))
}

/// Issued invoice ledger for one student
/// GET /students/{id}/invoices
pub async fn list_invoices(
    store: web::Data<Arc<dyn InvoiceStore>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let student_id = path.into_inner();
    let ledger = store.list_for_student(student_id).await?;

    Ok(HttpResponse::Ok().json(ledger))
}

/// Live monthly fee for display; mutates nothing
/// GET /students/{id}/fee
pub async fn current_fee(
    service: web::Data<Arc<InvoiceSynchronizer>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let student_id = path.into_inner();
    let amount = service.current_monthly_fee(student_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "student_id": student_id,
        "monthly_fee": amount,
    })))
}

/// Generate the current period's invoices for all active students
/// POST /billing/generate
pub async fn generate_all(
    service: web::Data<Arc<BulkGenerator>>,
) -> Result<HttpResponse, AppError> {
    let summary = service.generate_all().await?;

    Ok(HttpResponse::Ok().json(summary))
}

/// Route table for the billing module.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/students/{id}/invoices/sync",
        web::post().to(sync_invoice),
    )
    .route(
        "/students/{id}/invoices/upcoming",
        web::get().to(upcoming_invoices),
    )
    .route("/students/{id}/invoices", web::get().to(list_invoices))
    .route("/students/{id}/fee", web::get().to(current_fee))
    .route("/billing/generate", web::post().to(generate_all));
}
