//! Service summary store contract

use async_trait::async_trait;

#[derive(Debug)]
pub enum SummaryStoreError {
    Database(rusqlite::Error),
    Migration(String),
}

impl From<rusqlite::Error> for SummaryStoreError {
    fn from(err: rusqlite::Error) -> Self {
        SummaryStoreError::Database(err)
    }
}

impl std::fmt::Display for SummaryStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryStoreError::Database(e) => write!(f, "service database error: {}", e),
            SummaryStoreError::Migration(e) => write!(f, "schema migration error: {}", e),
        }
    }
}

impl std::error::Error for SummaryStoreError {}

/// One persisted day of financial totals
///
/// `transaction_date` is the Unix second at the start of the summarized
/// day; `fee_total` and `remain_total` are net of tax, `ppn_total` is the
/// extracted tax itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub transaction_date: i64,
    pub deposit_total: i64,
    pub withdraw_total: i64,
    pub fee_total: i64,
    pub upline_bonus_total: i64,
    pub remain_total: i64,
    pub ppn_total: i64,
}

/// Read/write access to persisted daily summaries
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// All persisted rows whose transaction date falls in `[start, end)`,
    /// ordered by transaction date
    async fn read_range(&self, start: i64, end: i64)
        -> Result<Vec<SummaryRow>, SummaryStoreError>;

    /// Persist freshly computed days as one all-or-nothing unit
    async fn insert_days(&self, rows: Vec<SummaryRow>) -> Result<(), SummaryStoreError>;
}
