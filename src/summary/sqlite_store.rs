//! SQLite implementation of the service summary store

use super::store::{SummaryRow, SummaryStore, SummaryStoreError};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Run schema bootstrap from SQL files
///
/// Reads all .sql files from the specified directory in name order and
/// executes them. Files must use "IF NOT EXISTS" clauses so the loader
/// stays idempotent across restarts.
pub fn run_schema_migrations(
    conn: &mut Connection,
    schema_dir: &str,
) -> Result<(), SummaryStoreError> {
    let schema_path = Path::new(schema_dir);

    if !schema_path.exists() {
        return Err(SummaryStoreError::Migration(format!(
            "schema directory not found: {}",
            schema_dir
        )));
    }

    conn.pragma_update(None, "journal_mode", "WAL")?;

    let mut sql_files: Vec<_> = fs::read_dir(schema_path)
        .map_err(|e| SummaryStoreError::Migration(e.to_string()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().and_then(|s| s.to_str()) == Some("sql"))
        .collect();

    sql_files.sort_by_key(|entry| entry.file_name());

    log::info!("🔧 running schema bootstrap from: {}", schema_dir);

    for entry in sql_files {
        let path = entry.path();
        let sql_content =
            fs::read_to_string(&path).map_err(|e| SummaryStoreError::Migration(e.to_string()))?;
        conn.execute_batch(&sql_content)?;
        log::info!("   └─ applied: {}", path.display());
    }

    Ok(())
}

/// Service store handle
pub struct SqliteSummaryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSummaryStore {
    /// Open the service store
    ///
    /// The database must already carry the schema (see
    /// [`run_schema_migrations`]); opening does not create tables.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, SummaryStoreError> {
        let conn = Connection::open(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    #[cfg(test)]
    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

#[async_trait]
impl SummaryStore for SqliteSummaryStore {
    async fn read_range(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<SummaryRow>, SummaryStoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT transaction_date, deposit_total, withdraw_total, fee_total,
                    upline_bonus_total, remain_total, ppn_total
             FROM daily_summaries
             WHERE transaction_date >= ?1 AND transaction_date < ?2
             ORDER BY transaction_date ASC",
        )?;
        let rows = stmt.query_map([start, end], |row| {
            Ok(SummaryRow {
                transaction_date: row.get(0)?,
                deposit_total: row.get(1)?,
                withdraw_total: row.get(2)?,
                fee_total: row.get(3)?,
                upline_bonus_total: row.get(4)?,
                remain_total: row.get(5)?,
                ppn_total: row.get(6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    async fn insert_days(&self, rows: Vec<SummaryRow>) -> Result<(), SummaryStoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        for row in &rows {
            tx.execute(
                "INSERT INTO daily_summaries (
                    transaction_date, deposit_total, withdraw_total, fee_total,
                    upline_bonus_total, remain_total, ppn_total
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row.transaction_date,
                    row.deposit_total,
                    row.withdraw_total,
                    row.fee_total,
                    row.upline_bonus_total,
                    row.remain_total,
                    row.ppn_total,
                ],
            )?;
        }
        tx.commit()?;

        log::debug!("💾 persisted {} daily summaries", rows.len());
        Ok(())
    }
}
