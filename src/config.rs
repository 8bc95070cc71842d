//! Service configuration from environment variables

use std::env;

/// Tax regime constants, loaded once at startup and passed into the engine
/// by value. The engine never mutates them.
#[derive(Debug, Clone, Copy)]
pub struct TaxConfig {
    /// Unix second at which the first VAT regime begins
    pub ppn_start: i64,

    /// Unix second at which the second VAT regime begins
    pub ppn_new_start: i64,

    /// Integer percentage applied from `ppn_start`
    pub ppn_rate: i64,

    /// Integer percentage applied from `ppn_new_start`
    pub ppn_new_rate: i64,
}

/// Configuration for the aggregation service
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the source-store SQLite file (raw transactions, read-only)
    pub source_db_path: String,

    /// Path to the service-store SQLite file (daily summaries)
    pub service_db_path: String,

    /// HTTP bind address
    pub bind_addr: String,

    /// VAT regime thresholds and rates
    pub tax: TaxConfig,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `TAXFLOW_SOURCE_DB_PATH` (default: /var/lib/taxflow/source.db)
    /// - `TAXFLOW_SERVICE_DB_PATH` (default: /var/lib/taxflow/service.db)
    /// - `TAXFLOW_BIND_ADDR` (default: 0.0.0.0:3000)
    /// - `PPN_START` (default: 1478624400)
    /// - `PPN_NEW_START` (default: 1648746000)
    /// - `PPN_RATE` (default: 10)
    /// - `PPN_NEW_RATE` (default: 11)
    pub fn from_env() -> Self {
        Self {
            source_db_path: env::var("TAXFLOW_SOURCE_DB_PATH")
                .unwrap_or_else(|_| "/var/lib/taxflow/source.db".to_string()),

            service_db_path: env::var("TAXFLOW_SERVICE_DB_PATH")
                .unwrap_or_else(|_| "/var/lib/taxflow/service.db".to_string()),

            bind_addr: env::var("TAXFLOW_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),

            tax: TaxConfig {
                ppn_start: env::var("PPN_START")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1_478_624_400),

                ppn_new_start: env::var("PPN_NEW_START")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1_648_746_000),

                ppn_rate: env::var("PPN_RATE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),

                ppn_new_rate: env::var("PPN_NEW_RATE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(11),
            },
        }
    }

    /// Reject configurations the engine cannot honor.
    ///
    /// The later regime threshold takes precedence wherever both apply, so
    /// the thresholds must be ordered.
    pub fn validate(&self) -> Result<(), String> {
        if self.tax.ppn_start > self.tax.ppn_new_start {
            return Err(format!(
                "PPN_START ({}) must not be after PPN_NEW_START ({})",
                self.tax.ppn_start, self.tax.ppn_new_start
            ));
        }
        if self.tax.ppn_rate < 0 || self.tax.ppn_new_rate < 0 {
            return Err("VAT rates must be non-negative percentages".to_string());
        }
        Ok(())
    }
}
