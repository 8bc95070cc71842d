//! Tax Aggregation Engine
//!
//! The algorithmic heart of the service. For a requested day range the
//! engine decides which days can be served from the service store as-is,
//! recomputes the missing trailing suffix from raw source transactions with
//! a concurrent query fan-out, applies the time-varying VAT rule per day,
//! and persists freshly computed past days for future reuse.
//!
//! ```text
//! report(start, days)
//!     ├─ SummaryStore.read_range          (cache / coverage decision)
//!     └─ fetch_source_totals              (trailing miss only)
//!           ├─ deposit / withdraw / fee / counter-fee fan-out (try_join!)
//!           ├─ per-day merge + VAT extraction
//!           └─ SummaryStore.insert_days   (past days only)
//! ```

pub mod calendar;
pub mod engine;
pub mod ppn;
pub mod types;

pub use engine::TaxEngine;
pub use types::{DailyAggregate, DailySummary, EngineError, TaxReport};
