//! Representative address selection.
//!
//! Every published block is assumed to be served uniformly, so one address
//! per block is enough to rank it. IPv4 blocks are probed at their network
//! address. IPv6 blocks are probed at network + 1, a low host that is
//! commonly assigned; this is a heuristic, not a guarantee of reachability.

use crate::config::InvalidRangePolicy;
use crate::models::{AddressRange, Candidate, Family};
use colored::Colorize;
use std::collections::HashSet;

/// Candidates picked from a range list, plus how many lines were rejected.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Selection {
    pub candidates: Vec<Candidate>,
    pub rejected: usize,
}

/// Pick the address that stands in for `range`.
pub fn representative(range: &AddressRange) -> Option<Candidate> {
    let addr = match range.family() {
        Family::V4 => range.network(),
        Family::V6 if range.is_single_address() => range.network(),
        Family::V6 => range.nth(1)?,
    };
    Some(Candidate {
        addr,
        range: *range,
    })
}

/// Parse one range line and pick its representative. Malformed lines give `None`.
pub fn select(line: &str) -> Option<Candidate> {
    AddressRange::new(line)
        .ok()
        .and_then(|range| representative(&range))
}

/// Select a candidate for every valid line. Duplicate candidates are kept once.
pub fn select_all<S: AsRef<str>>(lines: &[S], policy: InvalidRangePolicy) -> Selection {
    let mut selection = Selection::default();
    let mut seen = HashSet::new();

    for line in lines.iter().map(AsRef::as_ref) {
        let range = match AddressRange::new(line) {
            Ok(range) => range,
            Err(e) => {
                selection.rejected += 1;
                match policy {
                    InvalidRangePolicy::Warn => {
                        log::warn!("{skip} range '{line}': {e}", skip = "skipping".yellow())
                    }
                    InvalidRangePolicy::Silent => log::debug!("skipping range '{line}': {e}"),
                }
                continue;
            }
        };
        match representative(&range) {
            Some(candidate) if seen.insert(candidate.addr) => {
                log::trace!("{range} -> {candidate}");
                selection.candidates.push(candidate);
            }
            Some(candidate) => log::debug!("{range}: {candidate} already selected"),
            None => log::debug!("{range}: no usable host address"),
        }
    }

    if selection.rejected > 0 {
        log::info!("Rejected {} malformed ranges", selection.rejected);
    }
    selection
}
