//! Day-bucket anchoring and calendar rules

use chrono::{Datelike, TimeZone, Utc};

pub const SECS_PER_DAY: i64 = 86_400;

/// Ranges anchored before this instant (15 Feb 2014 00:00 UTC) number their
/// days from 15: the ledger's first tracked day in that month was the 15th.
/// The offset keeps cached rows and source recomputation aligned.
pub const LEDGER_EPOCH_CUTOVER: i64 = 1_393_632_000;

/// Fee rows before this instant live in the legacy fee table.
pub const LEGACY_FEE_CUTOFF: i64 = 1_662_742_800;

/// Fee rows at or after this instant live in the current fee table. The
/// single day between the two cutoffs must be read from both tables.
pub const CURRENT_FEE_START: i64 = 1_662_829_200;

/// Snap a timestamp onto the start of the day bucket containing it,
/// matching the convention the original per-day buckets were stored under.
pub fn round_day(t: i64) -> i64 {
    t - ((t + 7 * SECS_PER_DAY) % SECS_PER_DAY)
}

/// First day-of-month counter for a range anchored at `anchor`.
pub fn first_day_number(anchor: i64) -> i64 {
    if anchor < LEDGER_EPOCH_CUTOVER {
        15
    } else {
        1
    }
}

/// Whether the day starting at `day_start` is still accruing transactions.
///
/// A day in the current calendar month and year whose day-of-month has not
/// passed yet must be recomputed on every request and never persisted.
pub fn is_still_accruing(day_start: i64, now: i64) -> bool {
    let day = Utc.timestamp_opt(day_start, 0).single();
    let today = Utc.timestamp_opt(now, 0).single();
    match (day, today) {
        (Some(day), Some(today)) => {
            day.year() == today.year() && day.month() == today.month() && day.day() >= today.day()
        }
        // unrepresentable timestamp: refuse to cache it
        _ => true,
    }
}
