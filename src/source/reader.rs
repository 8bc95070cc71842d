//! Source aggregate reader contract
//!
//! Each operation takes a half-open `[start, end)` window of Unix seconds
//! and returns zero or more per-day rows. Numeric fields are `Option`s: a
//! day with no matching transactions either does not appear at all or
//! carries `None`, never a zero that could be mistaken for zero activity.

use async_trait::async_trait;

#[derive(Debug)]
pub enum SourceReadError {
    Database(rusqlite::Error),
}

impl From<rusqlite::Error> for SourceReadError {
    fn from(err: rusqlite::Error) -> Self {
        SourceReadError::Database(err)
    }
}

impl std::fmt::Display for SourceReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceReadError::Database(e) => write!(f, "source database error: {}", e),
        }
    }
}

impl std::error::Error for SourceReadError {}

/// Deposit totals for one calendar day
#[derive(Debug, Clone, Default)]
pub struct DepositDayRow {
    pub day_of_month: Option<i64>,
    pub deposit_total: Option<i64>,
}

/// Withdrawal totals for one calendar day (coupon payouts excluded)
#[derive(Debug, Clone, Default)]
pub struct WithdrawDayRow {
    pub day_of_month: Option<i64>,
    pub withdraw_total: Option<i64>,
}

/// Fee totals for one calendar day, from either fee table
#[derive(Debug, Clone, Default)]
pub struct FeeDayRow {
    pub day_of_month: Option<i64>,
    pub fee_total: Option<i64>,
    pub upline_bonus_total: Option<i64>,
    pub remain_total: Option<i64>,
}

/// Counter-trade fee totals for one calendar day
#[derive(Debug, Clone, Default)]
pub struct CounterFeeDayRow {
    pub day_of_month: Option<i64>,
    pub fee_total: Option<i64>,
}

/// Read-only aggregate queries against the source store
///
/// Fee bookkeeping moved tables once: rows before the migration live in a
/// legacy table, rows after it in the current table, and the day straddling
/// the move must be read from both via the `*_single_day` operations.
#[async_trait]
pub trait SourceLedgerReader: Send + Sync {
    /// Deposit totals per day over `[start, end)`
    async fn deposit_totals(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<DepositDayRow>, SourceReadError>;

    /// Withdrawal totals per day over `[start, end)`, excluding the
    /// `coupon` transaction subtype
    async fn withdraw_totals(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<WithdrawDayRow>, SourceReadError>;

    /// Fee totals per day from the current fee table over `[start, end)`
    async fn fee_totals(&self, start: i64, end: i64) -> Result<Vec<FeeDayRow>, SourceReadError>;

    /// Fee totals per day from the legacy fee table over `[start, end)`
    async fn legacy_fee_totals(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<FeeDayRow>, SourceReadError>;

    /// One aggregate fee row from the current table for a window known to
    /// cover a single day
    async fn fee_totals_single_day(
        &self,
        start: i64,
        end: i64,
    ) -> Result<FeeDayRow, SourceReadError>;

    /// One aggregate fee row from the legacy table for a window known to
    /// cover a single day
    async fn legacy_fee_totals_single_day(
        &self,
        start: i64,
        end: i64,
    ) -> Result<FeeDayRow, SourceReadError>;

    /// Successful counter-trade fee totals per day over `[start, end)`
    async fn counter_fee_totals(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<CounterFeeDayRow>, SourceReadError>;
}
