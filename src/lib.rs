//! Daily financial totals aggregation service
//!
//! Answers "what were the daily deposit/withdraw/fee/bonus/VAT totals for a
//! given date range?" against two stores:
//!
//! ```text
//! HTTP (axum) → TaxEngine
//!     ├─ SummaryStore (service database, pre-aggregated daily rows)
//!     └─ SourceLedgerReader (source database, raw transaction aggregates)
//! ```
//!
//! The engine serves cached daily summaries where they exist, recomputes the
//! missing trailing days from the source store with a concurrent query
//! fan-out, applies the time-varying VAT rule per day, and persists freshly
//! computed past days for future reuse.

pub mod config;
pub mod engine;
pub mod server;
pub mod source;
pub mod summary;
