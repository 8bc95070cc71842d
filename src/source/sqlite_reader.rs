//! SQLite implementation of the source aggregate reader
//!
//! Opens the source store in read-only mode; the service never writes the
//! system of record. Day grouping uses the UTC calendar day of the row
//! timestamp, which lines up with the engine's day-bucket anchoring.

use super::reader::{
    CounterFeeDayRow, DepositDayRow, FeeDayRow, SourceLedgerReader, SourceReadError,
    WithdrawDayRow,
};
use async_trait::async_trait;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Read-only source store handle
pub struct SqliteSourceReader {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSourceReader {
    /// Open the source store
    ///
    /// Enables read-only mode up front so a bad query can never take a
    /// write lock on the system of record.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, SourceReadError> {
        let conn = Connection::open(db_path)?;
        conn.execute("PRAGMA query_only = ON", [])?;

        log::info!("📖 source store opened read-only");

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

    fn fee_rows(&self, table: &str, start: i64, end: i64) -> Result<Vec<FeeDayRow>, SourceReadError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT CAST(strftime('%d', transaction_time, 'unixepoch') AS INTEGER) AS day_of_month,
                    SUM(fee) AS fee_total,
                    SUM(upline_bonus) AS upline_bonus_total,
                    SUM(remain) AS remain_total
             FROM {}
             WHERE transaction_time >= ?1 AND transaction_time < ?2
               AND kind NOT IN ('deposit', 'tax')
               AND upline_id != 1
             GROUP BY day_of_month
             ORDER BY day_of_month ASC",
            table
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([start, end], |row| {
            Ok(FeeDayRow {
                day_of_month: row.get(0)?,
                fee_total: row.get(1)?,
                upline_bonus_total: row.get(2)?,
                remain_total: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[async_trait]
impl SourceLedgerReader for SqliteSourceReader {
    async fn deposit_totals(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<DepositDayRow>, SourceReadError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT CAST(strftime('%d', success_time, 'unixepoch') AS INTEGER) AS day_of_month,
                    SUM(amount) AS deposit_total
             FROM deposits
             WHERE success_time >= ?1 AND success_time < ?2
             GROUP BY day_of_month
             ORDER BY day_of_month ASC",
        )?;
        let rows = stmt.query_map([start, end], |row| {
            Ok(DepositDayRow {
                day_of_month: row.get(0)?,
                deposit_total: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    async fn withdraw_totals(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<WithdrawDayRow>, SourceReadError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT CAST(strftime('%d', success_time, 'unixepoch') AS INTEGER) AS day_of_month,
                    SUM(amount) AS withdraw_total
             FROM withdrawals
             WHERE success_time >= ?1 AND success_time < ?2
               AND kind != 'coupon'
             GROUP BY day_of_month
             ORDER BY day_of_month ASC",
        )?;
        let rows = stmt.query_map([start, end], |row| {
            Ok(WithdrawDayRow {
                day_of_month: row.get(0)?,
                withdraw_total: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    async fn fee_totals(&self, start: i64, end: i64) -> Result<Vec<FeeDayRow>, SourceReadError> {
        self.fee_rows("fees", start, end)
    }

    async fn legacy_fee_totals(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<FeeDayRow>, SourceReadError> {
        self.fee_rows("fees_legacy", start, end)
    }

    async fn fee_totals_single_day(
        &self,
        start: i64,
        end: i64,
    ) -> Result<FeeDayRow, SourceReadError> {
        let mut rows = self.fee_rows("fees", start, end)?;
        Ok(rows.pop().unwrap_or_default())
    }

    async fn legacy_fee_totals_single_day(
        &self,
        start: i64,
        end: i64,
    ) -> Result<FeeDayRow, SourceReadError> {
        let mut rows = self.fee_rows("fees_legacy", start, end)?;
        Ok(rows.pop().unwrap_or_default())
    }

    async fn counter_fee_totals(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<CounterFeeDayRow>, SourceReadError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT CAST(strftime('%d', success_time, 'unixepoch') AS INTEGER) AS day_of_month,
                    SUM(fee) AS fee_total
             FROM counter_trades
             WHERE status = 'success'
               AND success_time >= ?1 AND success_time < ?2
             GROUP BY day_of_month
             ORDER BY day_of_month ASC",
        )?;
        let rows = stmt.query_map([start, end], |row| {
            Ok(CounterFeeDayRow {
                day_of_month: row.get(0)?,
                fee_total: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
