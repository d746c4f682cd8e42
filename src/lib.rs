//! Rank a provider's published IP ranges by measured latency.
//!
//! For each protocol family the pipeline fetches the provider's CIDR list,
//! picks one representative address per block, probes every address with a
//! bounded pool of ICMP or HTTP probes and writes the fastest `top_n` to a
//! file, one address per line.
//!
//! - [`source`] - range list retrieval
//! - [`processing`] - candidate selection, worker pool and ranking
//! - [`probe`] - ICMP and HTTP latency probes
//! - [`output`] - result files and terminal summary
//! - [`pipeline`] - the per-family driver

pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod probe;
pub mod processing;
pub mod source;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::PipelineError;
pub use pipeline::{run, run_family, run_with, FamilyReport, RunReport};
