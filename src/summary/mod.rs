//! Service store access - durable daily summary rows
//!
//! The service store is a lazily populated cache of per-day summaries
//! already computed by the engine. Rows are keyed by the absolute Unix
//! second of the day they summarize and are written exactly once, by the
//! engine's write-back pass.

pub mod sqlite_store;
pub mod store;

pub use sqlite_store::{run_schema_migrations, SqliteSummaryStore};
pub use store::{SummaryRow, SummaryStore, SummaryStoreError};
