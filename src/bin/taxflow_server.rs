//! Taxflow Server - daily financial totals over HTTP
//!
//! Startup sequence:
//! - Load `.env` and initialize logging
//! - Load and validate configuration
//! - Bootstrap the service-store schema (idempotent)
//! - Open both stores (the source store read-only)
//! - Serve `GET /tax` until CTRL+C
//!
//! Environment variables:
//!   TAXFLOW_SOURCE_DB_PATH  - source store SQLite file
//!   TAXFLOW_SERVICE_DB_PATH - service store SQLite file
//!   TAXFLOW_BIND_ADDR       - HTTP bind address (default: 0.0.0.0:3000)
//!   PPN_START / PPN_NEW_START / PPN_RATE / PPN_NEW_RATE - tax regimes

use dotenv::dotenv;
use log::{error, info};
use rusqlite::Connection;
use std::sync::Arc;
use taxflow::config::Config;
use taxflow::engine::TaxEngine;
use taxflow::server::{router, AppState};
use taxflow::source::SqliteSourceReader;
use taxflow::summary::{run_schema_migrations, SqliteSummaryStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    info!("🚀 Taxflow Server");

    let config = Config::from_env();
    if let Err(e) = config.validate() {
        error!("❌ invalid configuration: {}", e);
        return Err(e.into());
    }

    info!("✅ Configuration loaded");
    info!("   ├─ Source store: {}", config.source_db_path);
    info!("   ├─ Service store: {}", config.service_db_path);
    info!("   ├─ Bind address: {}", config.bind_addr);
    info!(
        "   └─ Tax regimes: {}% from {}, {}% from {}",
        config.tax.ppn_rate, config.tax.ppn_start, config.tax.ppn_new_rate, config.tax.ppn_new_start
    );

    // Bootstrap the service-store schema (idempotent)
    let mut conn = Connection::open(&config.service_db_path)?;
    run_schema_migrations(&mut conn, "sql")?;
    drop(conn);

    let source = Arc::new(SqliteSourceReader::new(&config.source_db_path)?);
    let summary = Arc::new(SqliteSummaryStore::new(&config.service_db_path)?);
    let engine = Arc::new(TaxEngine::new(source, summary, config.tax));
    info!("✅ Stores opened, engine ready");

    let app = router(AppState { engine });
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("✅ Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("✅ Taxflow server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("⚠️  Received CTRL+C, shutting down...");
        }
        Err(err) => {
            error!("❌ Failed to listen for CTRL+C: {}", err);
        }
    }
}
