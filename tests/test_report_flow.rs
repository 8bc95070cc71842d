//! End-to-end report flow against real SQLite stores
//!
//! Drives the engine through both stores twice: the first request must
//! recompute from raw transactions and persist the settled days, the second
//! must be served entirely from the service store with identical results.

use rusqlite::{params, Connection};
use std::sync::Arc;
use taxflow::config::TaxConfig;
use taxflow::engine::TaxEngine;
use taxflow::source::SqliteSourceReader;
use taxflow::summary::{SqliteSummaryStore, SummaryStore};
use tempfile::tempdir;

const DAY: i64 = 86_400;
// 2024-01-01 00:00:00 UTC
const BASE: i64 = 1_704_067_200;

fn create_source_db(path: &std::path::Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE deposits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            success_time INTEGER NOT NULL,
            amount INTEGER NOT NULL
        );
        CREATE TABLE withdrawals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            success_time INTEGER NOT NULL,
            amount INTEGER NOT NULL,
            kind TEXT NOT NULL DEFAULT 'standard'
        );
        CREATE TABLE fees (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            transaction_time INTEGER NOT NULL,
            fee INTEGER NOT NULL,
            upline_bonus INTEGER NOT NULL,
            remain INTEGER NOT NULL,
            kind TEXT NOT NULL DEFAULT 'trade',
            upline_id INTEGER NOT NULL DEFAULT 2
        );
        CREATE TABLE fees_legacy (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            transaction_time INTEGER NOT NULL,
            fee INTEGER NOT NULL,
            upline_bonus INTEGER NOT NULL,
            remain INTEGER NOT NULL,
            kind TEXT NOT NULL DEFAULT 'trade',
            upline_id INTEGER NOT NULL DEFAULT 2
        );
        CREATE TABLE counter_trades (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            success_time INTEGER NOT NULL,
            fee INTEGER NOT NULL,
            status TEXT NOT NULL
        );",
    )
    .unwrap();

    // two days of activity
    conn.execute(
        "INSERT INTO deposits (success_time, amount) VALUES (?1, 10000), (?2, 20000)",
        params![BASE + 100, BASE + DAY + 100],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO withdrawals (success_time, amount) VALUES (?1, 4000)",
        params![BASE + 200],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO fees (transaction_time, fee, upline_bonus, remain) VALUES (?1, 1000, 100, 900)",
        params![BASE + 300],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO counter_trades (success_time, fee, status) VALUES (?1, 100, 'success')",
        params![BASE + 400],
    )
    .unwrap();
}

fn create_service_db(path: &std::path::Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute(
        "CREATE TABLE IF NOT EXISTS daily_summaries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            transaction_date INTEGER NOT NULL,
            deposit_total INTEGER NOT NULL,
            withdraw_total INTEGER NOT NULL,
            fee_total INTEGER NOT NULL,
            upline_bonus_total INTEGER NOT NULL,
            remain_total INTEGER NOT NULL,
            ppn_total INTEGER NOT NULL
        )",
        [],
    )
    .unwrap();
}

#[tokio::test]
async fn test_recompute_then_cache_hit_roundtrip() {
    let dir = tempdir().unwrap();
    let source_path = dir.path().join("source.db");
    let service_path = dir.path().join("service.db");
    create_source_db(&source_path);
    create_service_db(&service_path);

    let source = Arc::new(SqliteSourceReader::new(&source_path).unwrap());
    let summary = Arc::new(SqliteSummaryStore::new(&service_path).unwrap());

    // 10% VAT from the range start; settled long ago
    let tax = TaxConfig {
        ppn_start: BASE,
        ppn_new_start: BASE + 10 * DAY,
        ppn_rate: 10,
        ppn_new_rate: 11,
    };
    let engine = TaxEngine::with_timestamp_fn(
        source,
        summary.clone(),
        tax,
        Box::new(|| 1_900_000_000),
    );

    let first = engine.report(BASE, 2).await.unwrap();

    assert_eq!(first.summary.len(), 2);
    assert_eq!(first.summary[0].day_of_month, 1);
    assert_eq!(first.summary[0].deposit_total, 10_000);
    assert_eq!(first.summary[0].withdraw_total, 4_000);
    // fee 1000 + counter fee 100, then 10% inclusive VAT extracted:
    // ppn = ceil(1100 * 10 / 110) = 100
    assert_eq!(first.summary[0].ppn_total, 100);
    assert_eq!(first.summary[0].fee_total, 1_000);
    // remain 900 + counter 100 - ppn 100
    assert_eq!(first.summary[0].remain_total, 900);
    assert_eq!(first.summary[1].deposit_total, 20_000);
    assert_eq!(first.summary[1].fee_total, 0);
    assert_eq!(first.total_revenue, 1_000);
    assert_eq!(first.total_ppn, 100);

    // both settled days were persisted
    let persisted = summary.read_range(BASE, BASE + 2 * DAY).await.unwrap();
    assert_eq!(persisted.len(), 2);
    assert_eq!(persisted[0].transaction_date, BASE);
    assert_eq!(persisted[0].fee_total, 1_000);

    // second identical request: pure cache hit with identical results
    let second = engine.report(BASE, 2).await.unwrap();
    assert_eq!(second, first);
    let persisted_again = summary.read_range(BASE, BASE + 2 * DAY).await.unwrap();
    assert_eq!(persisted_again.len(), 2);
}

#[tokio::test]
async fn test_partial_coverage_extends_the_cache() {
    let dir = tempdir().unwrap();
    let source_path = dir.path().join("source.db");
    let service_path = dir.path().join("service.db");
    create_source_db(&source_path);
    create_service_db(&service_path);

    let source = Arc::new(SqliteSourceReader::new(&source_path).unwrap());
    let summary = Arc::new(SqliteSummaryStore::new(&service_path).unwrap());
    let tax = TaxConfig {
        ppn_start: 1_478_624_400,
        ppn_new_start: 1_648_746_000,
        ppn_rate: 10,
        ppn_new_rate: 11,
    };
    let engine = TaxEngine::with_timestamp_fn(
        source,
        summary.clone(),
        tax,
        Box::new(|| 1_900_000_000),
    );

    // warm the cache with a 1-day range, then request 3 days
    engine.report(BASE, 1).await.unwrap();
    assert_eq!(summary.read_range(BASE, BASE + 3 * DAY).await.unwrap().len(), 1);

    let report = engine.report(BASE, 3).await.unwrap();

    assert_eq!(report.summary.len(), 3);
    assert_eq!(report.summary[1].deposit_total, 20_000);
    // all three days are now persisted
    assert_eq!(summary.read_range(BASE, BASE + 3 * DAY).await.unwrap().len(), 3);
}
