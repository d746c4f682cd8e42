//! Per-family driver: fetch ranges, select candidates, rank, write.
//!
//! Each family runs to completion on its own and reports what happened; a
//! failure in one family (no ranges, nothing reachable, unwritable output)
//! never stops the other.

use crate::config::Config;
use crate::error::PipelineError;
use crate::models::{Family, RankedList};
use crate::output::write_addresses;
use crate::probe::{ProbeStrategy, Prober};
use crate::processing::{rank, select_all, WorkerPool};
use crate::source::fetch_ranges;
use colored::Colorize;
use std::sync::Arc;

/// Families processed by a run, in order.
pub const FAMILIES: [Family; 2] = [Family::V4, Family::V6];

/// What one family's run produced.
#[derive(Debug)]
pub struct FamilyReport {
    pub family: Family,
    /// Lines in the fetched range list.
    pub ranges: usize,
    /// Lines that were not valid ranges.
    pub rejected: usize,
    /// Addresses probed.
    pub candidates: usize,
    pub ranked: RankedList,
    /// Number of addresses written, or why the file could not be written.
    pub written: Result<usize, PipelineError>,
}

impl FamilyReport {
    /// A non-empty shortlist was produced and saved.
    pub fn is_success(&self) -> bool {
        !self.ranked.is_empty() && self.written.is_ok()
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub families: Vec<FamilyReport>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.families.iter().all(FamilyReport::is_success)
    }
}

/// Run both families with the probe strategy named in `config`.
pub async fn run(config: &Config) -> RunReport {
    let prober = Arc::new(ProbeStrategy::from_config(config));
    run_with(config, prober).await
}

/// Run both families with a caller-supplied prober.
pub async fn run_with<P>(config: &Config, prober: Arc<P>) -> RunReport
where
    P: Prober + 'static,
{
    let mut families = Vec::with_capacity(FAMILIES.len());
    for family in FAMILIES {
        families.push(run_family(config, family, Arc::clone(&prober)).await);
    }
    RunReport { families }
}

/// Fetch, select, rank and write one family.
pub async fn run_family<P>(config: &Config, family: Family, prober: Arc<P>) -> FamilyReport
where
    P: Prober + 'static,
{
    let family_config = config.family(family);
    log::info!(
        "Fetching {family} ranges from {url}",
        url = family_config.source_url.on_blue()
    );
    let lines = fetch_ranges(&family_config.source_url, config.fetch_timeout()).await;

    let selection = select_all(&lines, config.invalid_ranges);
    let candidates = selection.candidates.len();
    log::info!(
        "Found {candidates} {family} candidates in {} ranges",
        lines.len()
    );

    let pool = WorkerPool::new(config.workers);
    let ranked = rank(selection.candidates, prober, &pool, config.top_n).await;

    let written = write_addresses(&family_config.output_path, &ranked.addresses());
    if let Err(e) = &written {
        log::error!("{failed} {e}", failed = "write failed".on_red());
    }

    FamilyReport {
        family,
        ranges: lines.len(),
        rejected: selection.rejected,
        candidates,
        ranked,
        written,
    }
}
