use crate::core::{AppError, Result};
use serde::Deserialize;
use std::env;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub billing: BillingConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Day of the month invoices fall due.
    pub due_day: u32,
    /// Default projection horizon.
    pub horizon_months: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            billing: BillingConfig {
                due_day: env::var("BILLING_DUE_DAY")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .map_err(|_| AppError::Configuration("Invalid BILLING_DUE_DAY".to_string()))?,
                horizon_months: env::var("BILLING_HORIZON_MONTHS")
                    .unwrap_or_else(|_| "12".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::Configuration("Invalid BILLING_HORIZON_MONTHS".to_string())
                    })?,
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Due day 29-31 does not exist in every month.
        if self.billing.due_day == 0 || self.billing.due_day > 28 {
            return Err(AppError::Configuration(
                "Billing due day must be between 1 and 28".to_string(),
            ));
        }

        if self.billing.horizon_months == 0 {
            return Err(AppError::Configuration(
                "Billing horizon must be at least 1 month".to_string(),
            ));
        }

        Ok(())
    }
}
