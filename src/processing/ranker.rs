//! Latency ranking of candidates.

use super::pool::WorkerPool;
use crate::models::{Candidate, ProbeResult, RankedList};
use crate::probe::Prober;
use std::sync::Arc;

/// Probe every candidate through `pool` and keep the `top_n` fastest.
///
/// Each candidate is probed once; unreachable ones are dropped. Fewer than
/// `top_n` reachable candidates yields a shorter list, never an error.
pub async fn rank<P>(
    candidates: Vec<Candidate>,
    prober: Arc<P>,
    pool: &WorkerPool,
    top_n: usize,
) -> RankedList
where
    P: Prober + 'static,
{
    let probed = candidates.len();
    log::info!(
        "Probing {probed} candidates with {} workers",
        pool.capacity()
    );

    let results = pool
        .run(candidates, |candidate| {
            let prober = Arc::clone(&prober);
            async move {
                let latency = prober.probe(candidate.addr).await;
                log::debug!("{} ({}) -> {latency}", candidate.addr, candidate.range);
                ProbeResult { candidate, latency }
            }
        })
        .await;

    let reachable = results.iter().filter(|r| r.latency.is_reachable()).count();
    let ranked = rank_results(results, top_n);
    log::info!(
        "probed={probed} reachable={reachable} kept={kept}",
        kept = ranked.len()
    );
    ranked
}

/// Drop unreachable results, sort ascending by latency and keep `top_n`.
///
/// Equal latencies are ordered by address so the output does not depend on
/// probe completion order.
pub fn rank_results(results: Vec<ProbeResult>, top_n: usize) -> RankedList {
    let mut reachable: Vec<ProbeResult> = results
        .into_iter()
        .filter(|r| r.latency.is_reachable())
        .collect();
    reachable.sort_by(|a, b| {
        a.latency
            .total_cmp(&b.latency)
            .then_with(|| a.candidate.addr.cmp(&b.candidate.addr))
    });
    reachable.truncate(top_n);
    RankedList::new(reachable)
}
