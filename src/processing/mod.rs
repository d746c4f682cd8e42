//! Candidate selection and ranking.
//!
//! - [`selector`] - one representative address per range
//! - [`pool`] - bounded concurrency for probes
//! - [`ranker`] - probe, filter, sort and truncate

mod pool;
mod ranker;
mod selector;

// Re-export public functions
pub use pool::WorkerPool;
pub use ranker::{rank, rank_results};
pub use selector::{representative, select, select_all, Selection};
