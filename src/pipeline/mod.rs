//! Pipeline entry points for job feed runs.
//!
//! - `Paginator`: walk a source's listing pages
//! - `Deduplicator`: isolate listings the ledger has never seen
//! - `Pipeline`: enrich, persist and notify each new listing
//! - `run_scheduled`: repeat passes on a fixed interval

pub mod dedup;
pub mod paginate;
pub mod run;
pub mod schedule;

pub use dedup::{DedupResult, Deduplicator};
pub use paginate::Paginator;
pub use run::{Pipeline, RunReport};
pub use schedule::{log_pass_summary, run_scheduled, run_until};
