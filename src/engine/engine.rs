//! Range orchestration: cache decisioning, recomputation fan-out, tax, write-back

use super::calendar::{
    first_day_number, is_still_accruing, round_day, CURRENT_FEE_START, LEDGER_EPOCH_CUTOVER,
    LEGACY_FEE_CUTOFF, SECS_PER_DAY,
};
use super::ppn;
use super::types::{DailyAggregate, DailySummary, EngineError, TaxReport};
use crate::config::TaxConfig;
use crate::source::{FeeDayRow, SourceLedgerReader};
use crate::summary::{SummaryRow, SummaryStore};
use std::sync::Arc;

/// Daily totals engine over the two stores
///
/// Holds the immutable tax configuration and a timestamp function; the
/// latter is injectable so the write-back eligibility rule is testable with
/// deterministic time.
pub struct TaxEngine {
    source: Arc<dyn SourceLedgerReader>,
    summary: Arc<dyn SummaryStore>,
    tax: TaxConfig,
    now_fn: Box<dyn Fn() -> i64 + Send + Sync>,
}

/// Slot position for a day key, relative to the range's first day number.
///
/// Day keys outside the range are dropped by the caller; every query's
/// result set merges into its own disjoint field, so a valid key never has
/// two concurrent writers.
fn slot_index(day: i64, start_day: i64, len: usize) -> Option<usize> {
    usize::try_from(day - start_day).ok().filter(|&i| i < len)
}

fn sum_valid(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (None, None) => None,
        _ => Some(a.unwrap_or(0) + b.unwrap_or(0)),
    }
}

impl TaxEngine {
    pub fn new(
        source: Arc<dyn SourceLedgerReader>,
        summary: Arc<dyn SummaryStore>,
        tax: TaxConfig,
    ) -> Self {
        Self::with_timestamp_fn(source, summary, tax, Box::new(|| chrono::Utc::now().timestamp()))
    }

    /// Create an engine with a custom timestamp function (deterministic
    /// time for tests)
    pub fn with_timestamp_fn(
        source: Arc<dyn SourceLedgerReader>,
        summary: Arc<dyn SummaryStore>,
        tax: TaxConfig,
        now_fn: Box<dyn Fn() -> i64 + Send + Sync>,
    ) -> Self {
        Self {
            source,
            summary,
            tax,
            now_fn,
        }
    }

    /// Daily totals for `amount_of_days` days starting at `start_date`.
    ///
    /// Serves persisted summaries where they exist, recomputes the missing
    /// trailing days from the source store, persists the freshly computed
    /// past days, and returns the combined report. The persist step
    /// completes (or fails) before the report is produced.
    pub async fn report(
        &self,
        start_date: i64,
        amount_of_days: i64,
    ) -> Result<TaxReport, EngineError> {
        if amount_of_days < 1 {
            return Err(EngineError::InvalidRange(format!(
                "amount_of_days must be at least 1, got {}",
                amount_of_days
            )));
        }
        let n = amount_of_days as usize;
        let begin = round_day(start_date);
        let end = begin + amount_of_days * SECS_PER_DAY;
        let start_day = first_day_number(begin);

        let mut summaries: Vec<DailySummary> = (0..amount_of_days)
            .map(|i| DailySummary::empty(start_day + i))
            .collect();
        let mut report = TaxReport::default();

        let cached = self.summary.read_range(begin, end).await?;

        // Coverage gaps are only ever a trailing suffix: the write-back
        // policy below never persists a day ahead of an unpersisted one.
        let covered_days = if cached.is_empty() {
            0
        } else {
            let max_rel = cached
                .iter()
                .map(|row| (row.transaction_date - begin) / SECS_PER_DAY)
                .max()
                .unwrap_or(-1);
            (max_rel + 1).clamp(0, amount_of_days) as usize
        };

        for row in &cached {
            let rel = (row.transaction_date - begin) / SECS_PER_DAY;
            let Some(slot) = usize::try_from(rel).ok().and_then(|i| summaries.get_mut(i)) else {
                log::warn!(
                    "cached summary outside requested range ignored: date={}",
                    row.transaction_date
                );
                continue;
            };
            slot.deposit_total = row.deposit_total;
            slot.withdraw_total = row.withdraw_total;
            slot.fee_total = row.fee_total;
            slot.upline_bonus_total = row.upline_bonus_total;
            slot.remain_total = row.remain_total;
            slot.ppn_total = row.ppn_total;

            report.total_revenue += row.fee_total;
            report.total_upline_bonus += row.upline_bonus_total;
            report.total_remain += row.remain_total;
            report.total_ppn += row.ppn_total;
        }

        if covered_days == n {
            log::debug!("range [{}, {}) fully served from service store", begin, end);
            report.summary = summaries;
            return Ok(report);
        }

        let continue_date = begin + covered_days as i64 * SECS_PER_DAY;
        let suffix = self
            .fetch_source_totals(
                continue_date,
                end,
                start_day + covered_days as i64,
                amount_of_days - covered_days as i64,
            )
            .await?;

        let now = (self.now_fn)();
        let mut to_persist = Vec::new();
        for day in &suffix.summary {
            let rel = day.day_of_month - start_day;
            let Some(slot) = usize::try_from(rel).ok().and_then(|i| summaries.get_mut(i)) else {
                continue;
            };
            *slot = day.clone();

            let day_start = begin + rel * SECS_PER_DAY;
            if is_still_accruing(day_start, now) {
                // partial day: recomputed on every request, never cached
                continue;
            }
            to_persist.push(SummaryRow {
                transaction_date: day_start,
                deposit_total: day.deposit_total,
                withdraw_total: day.withdraw_total,
                fee_total: day.fee_total,
                upline_bonus_total: day.upline_bonus_total,
                remain_total: day.remain_total,
                ppn_total: day.ppn_total,
            });
        }

        report.total_revenue += suffix.total_revenue;
        report.total_bank_fee += suffix.total_bank_fee;
        report.total_upline_bonus += suffix.total_upline_bonus;
        report.total_remain += suffix.total_remain;
        report.total_ppn += suffix.total_ppn;

        if !to_persist.is_empty() {
            self.summary.insert_days(to_persist).await?;
        }

        report.summary = summaries;
        Ok(report)
    }

    /// Recompute a day range from raw source transactions.
    ///
    /// Issues the deposit, withdrawal, fee and counter-fee aggregates
    /// concurrently; `try_join!` is the completion barrier, and all slot
    /// merging happens sequentially after it, so the day-indexed slots
    /// never see two writers. Any failed fetch aborts the recomputation.
    pub async fn fetch_source_totals(
        &self,
        start_date: i64,
        end_date: i64,
        start_day: i64,
        amount_of_days: i64,
    ) -> Result<TaxReport, EngineError> {
        // historical ledger anchor: the bucket's first tracked day is the 15th
        let start_day = if start_date < LEDGER_EPOCH_CUTOVER && start_day < 15 {
            15
        } else {
            start_day
        };
        let n = amount_of_days.max(0) as usize;

        let mut summaries: Vec<DailySummary> = (0..amount_of_days.max(0))
            .map(|i| DailySummary::empty(start_day + i))
            .collect();
        let mut aggregates: Vec<DailyAggregate> = (0..amount_of_days.max(0))
            .map(|i| DailyAggregate::empty(start_day + i))
            .collect();
        let mut report = TaxReport::default();

        let (deposits, withdrawals, fees, counter_fees) = tokio::try_join!(
            async {
                self.source
                    .deposit_totals(start_date, end_date)
                    .await
                    .map_err(EngineError::Source)
            },
            async {
                self.source
                    .withdraw_totals(start_date, end_date)
                    .await
                    .map_err(EngineError::Source)
            },
            self.fetch_fee_totals(start_date, end_date),
            async {
                self.source
                    .counter_fee_totals(start_date, end_date)
                    .await
                    .map_err(EngineError::Source)
            },
        )?;

        for row in &deposits {
            let (Some(day), Some(total)) = (row.day_of_month, row.deposit_total) else {
                continue;
            };
            if let Some(i) = slot_index(day, start_day, n) {
                summaries[i].deposit_total = total;
            }
        }

        for row in &withdrawals {
            let (Some(day), Some(total)) = (row.day_of_month, row.withdraw_total) else {
                continue;
            };
            if let Some(i) = slot_index(day, start_day, n) {
                summaries[i].withdraw_total = total;
            }
        }

        for row in &fees {
            let Some(day) = row.day_of_month else { continue };
            if let Some(i) = slot_index(day, start_day, n) {
                aggregates[i].fee_total = row.fee_total.unwrap_or(0);
                aggregates[i].upline_bonus_total = row.upline_bonus_total.unwrap_or(0);
                aggregates[i].remain_total = row.remain_total.unwrap_or(0);
            }
        }

        // Counter-trade fees add into the same slots as fee totals, which
        // is safe here: the fee merge above has already finished.
        for row in &counter_fees {
            let (Some(day), Some(fee)) = (row.day_of_month, row.fee_total) else {
                continue;
            };
            if let Some(i) = slot_index(day, start_day, n) {
                aggregates[i].fee_total += fee;
                aggregates[i].remain_total += fee;
            }
        }

        for aggregate in &mut aggregates {
            let rel = aggregate.day_of_month - start_day;
            let date = start_date + rel * SECS_PER_DAY;
            let day_ppn = match ppn::rate_for(date, &self.tax) {
                Some(rate) => ppn::extract_ppn(aggregate.fee_total, rate),
                None => 0,
            };
            aggregate.fee_total -= day_ppn;
            aggregate.remain_total -= day_ppn;

            let slot = &mut summaries[rel as usize];
            slot.fee_total = aggregate.fee_total;
            slot.upline_bonus_total = aggregate.upline_bonus_total;
            slot.remain_total = aggregate.remain_total;
            slot.ppn_total = day_ppn;

            report.total_revenue += aggregate.fee_total;
            report.total_upline_bonus += aggregate.upline_bonus_total;
            report.total_remain += aggregate.remain_total;
            report.total_ppn += day_ppn;
        }

        report.summary = summaries;
        Ok(report)
    }

    /// Fee totals for `[start, end)`, spanning the fee-table migration.
    ///
    /// Ranges entirely on one side of the migration read one table; a range
    /// straddling it reads the legacy range, the migration day itself from
    /// both tables summed into one row, and the current range.
    async fn fetch_fee_totals(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<FeeDayRow>, EngineError> {
        if end <= LEGACY_FEE_CUTOFF {
            return Ok(self.source.legacy_fee_totals(start, end).await?);
        }
        if start >= CURRENT_FEE_START {
            return Ok(self.source.fee_totals(start, end).await?);
        }

        let (mut rows, boundary, current) = tokio::try_join!(
            async {
                if start < LEGACY_FEE_CUTOFF {
                    self.source
                        .legacy_fee_totals(start, LEGACY_FEE_CUTOFF)
                        .await
                        .map_err(EngineError::Source)
                } else {
                    Ok(Vec::new())
                }
            },
            async {
                let current = self
                    .source
                    .fee_totals_single_day(LEGACY_FEE_CUTOFF, CURRENT_FEE_START)
                    .await
                    .map_err(EngineError::Source)?;
                let legacy = self
                    .source
                    .legacy_fee_totals_single_day(LEGACY_FEE_CUTOFF, CURRENT_FEE_START)
                    .await
                    .map_err(EngineError::Source)?;
                Ok(FeeDayRow {
                    day_of_month: current.day_of_month.or(legacy.day_of_month),
                    fee_total: sum_valid(current.fee_total, legacy.fee_total),
                    upline_bonus_total: sum_valid(
                        current.upline_bonus_total,
                        legacy.upline_bonus_total,
                    ),
                    remain_total: sum_valid(current.remain_total, legacy.remain_total),
                })
            },
            async {
                if end > CURRENT_FEE_START {
                    self.source
                        .fee_totals(CURRENT_FEE_START, end)
                        .await
                        .map_err(EngineError::Source)
                } else {
                    Ok(Vec::new())
                }
            },
        )?;

        if boundary.day_of_month.is_some() {
            rows.push(boundary);
        }
        rows.extend(current);
        Ok(rows)
    }
}
