use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feeledger::config::Config;
use feeledger::modules::audit::{AuditSink, LogStaleViewSignal, MySqlAuditSink, StaleViewSignal};
use feeledger::modules::billing::controllers::billing_controller;
use feeledger::modules::billing::repositories::{InvoiceStore, MySqlInvoiceStore};
use feeledger::modules::billing::services::{AdvanceProjector, BulkGenerator, InvoiceSynchronizer};
use feeledger::modules::students::repositories::{MySqlStudentDirectory, StudentDirectory};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feeledger=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");
    config.validate().expect("Configuration validation failed");

    tracing::info!("Starting fee ledger service");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .expect("Failed to create database pool");

    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.pool_size
    );

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // Wire collaborators and services
    let directory: Arc<dyn StudentDirectory> =
        Arc::new(MySqlStudentDirectory::new(db_pool.clone()));
    let invoices: Arc<dyn InvoiceStore> = Arc::new(MySqlInvoiceStore::new(db_pool.clone()));
    let audit: Arc<dyn AuditSink> = Arc::new(MySqlAuditSink::new(db_pool.clone()));
    let stale_view: Arc<dyn StaleViewSignal> = Arc::new(LogStaleViewSignal);

    let synchronizer = Arc::new(InvoiceSynchronizer::new(
        directory.clone(),
        invoices.clone(),
        stale_view.clone(),
        config.billing.due_day,
    ));
    let projector = Arc::new(AdvanceProjector::new(
        directory.clone(),
        invoices.clone(),
        stale_view.clone(),
        config.billing.horizon_months,
    ));
    let generator = Arc::new(BulkGenerator::new(
        directory.clone(),
        synchronizer.clone(),
        audit.clone(),
    ));

    // Start HTTP server
    let bind_address = config.server.bind_address();
    let workers = config.server.workers;
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(Cors::default().allow_any_origin().allow_any_method())
            .app_data(web::Data::new(synchronizer.clone()))
            .app_data(web::Data::new(projector.clone()))
            .app_data(web::Data::new(generator.clone()))
            .app_data(web::Data::new(invoices.clone()))
            .configure(billing_controller::configure)
            .route("/health", web::get().to(health_check))
    })
    .workers(workers)
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "feeledger"
    }))
}
