//! Data model for the aggregation engine

use crate::source::SourceReadError;
use crate::summary::SummaryStoreError;
use serde::Serialize;

/// One day of net financial totals as served to clients
///
/// `fee_total` and `remain_total` are net of tax; `ppn_total` carries the
/// extracted tax itself. `day_of_month` is the relative day counter for the
/// requested range, not the calendar day of the absolute date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    #[serde(rename = "deposit")]
    pub deposit_total: i64,
    #[serde(rename = "withdraw")]
    pub withdraw_total: i64,
    #[serde(rename = "fee")]
    pub fee_total: i64,
    #[serde(rename = "upline_bonus")]
    pub upline_bonus_total: i64,
    #[serde(rename = "remain")]
    pub remain_total: i64,
    #[serde(rename = "ppn")]
    pub ppn_total: i64,
    pub day_of_month: i64,
}

impl DailySummary {
    pub fn empty(day_of_month: i64) -> Self {
        Self {
            day_of_month,
            ..Default::default()
        }
    }
}

/// Pre-tax per-day aggregate, alive only inside the recomputation path
#[derive(Debug, Clone, Default)]
pub struct DailyAggregate {
    pub day_of_month: i64,
    pub fee_total: i64,
    pub upline_bonus_total: i64,
    pub remain_total: i64,
}

impl DailyAggregate {
    pub fn empty(day_of_month: i64) -> Self {
        Self {
            day_of_month,
            ..Default::default()
        }
    }
}

/// Range-level report: one summary entry per requested day plus totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaxReport {
    pub summary: Vec<DailySummary>,
    pub total_revenue: i64,
    /// Reserved for a future per-transaction bank fee; always 0 today.
    pub total_bank_fee: i64,
    pub total_upline_bonus: i64,
    pub total_remain: i64,
    pub total_ppn: i64,
}

#[derive(Debug)]
pub enum EngineError {
    /// The request was rejected before any store access
    InvalidRange(String),
    Source(SourceReadError),
    Summary(SummaryStoreError),
}

impl From<SourceReadError> for EngineError {
    fn from(err: SourceReadError) -> Self {
        EngineError::Source(err)
    }
}

impl From<SummaryStoreError> for EngineError {
    fn from(err: SummaryStoreError) -> Self {
        EngineError::Summary(err)
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidRange(msg) => write!(f, "invalid range: {}", msg),
            EngineError::Source(e) => write!(f, "{}", e),
            EngineError::Summary(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for EngineError {}
