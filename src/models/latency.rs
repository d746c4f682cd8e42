//! Probe measurements and the ranked shortlist built from them.

use super::Candidate;
use std::cmp::Ordering;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// Outcome of one probe: a round trip in milliseconds, or unreachable.
///
/// `Unreachable` sorts after every measurement, like +infinity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Latency {
    Millis(f64),
    Unreachable,
}

impl Latency {
    /// Wrap a millisecond value. Negative or non-finite values are not a
    /// measurement and become `Unreachable`.
    pub fn millis(ms: f64) -> Latency {
        if ms.is_finite() && ms >= 0.0 {
            Latency::Millis(ms)
        } else {
            Latency::Unreachable
        }
    }

    pub fn from_duration(elapsed: Duration) -> Latency {
        Latency::millis(elapsed.as_nanos() as f64 / 1_000_000.0)
    }

    pub fn as_millis(&self) -> Option<f64> {
        match self {
            Latency::Millis(ms) => Some(*ms),
            Latency::Unreachable => None,
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self, Latency::Millis(_))
    }

    /// Total order with `Unreachable` last.
    pub fn total_cmp(&self, other: &Latency) -> Ordering {
        let key = |l: &Latency| l.as_millis().unwrap_or(f64::INFINITY);
        key(self).total_cmp(&key(other))
    }
}

impl PartialOrd for Latency {
    fn partial_cmp(&self, other: &Latency) -> Option<Ordering> {
        Some(self.total_cmp(other))
    }
}

impl fmt::Display for Latency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Latency::Millis(ms) => write!(f, "{ms:.3} ms"),
            Latency::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// A candidate paired with its measured latency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeResult {
    pub candidate: Candidate,
    pub latency: Latency,
}

/// Reachable candidates in ascending latency order, capped at `top_n`.
///
/// Only [`crate::processing::rank_results`] builds one, so the ordering and
/// "no unreachable entries" properties hold for every instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedList {
    entries: Vec<ProbeResult>,
}

impl RankedList {
    pub(crate) fn new(entries: Vec<ProbeResult>) -> RankedList {
        RankedList { entries }
    }

    pub fn entries(&self) -> &[ProbeResult] {
        &self.entries
    }

    /// Addresses in ranked order, most preferred first.
    pub fn addresses(&self) -> Vec<IpAddr> {
        self.entries.iter().map(|r| r.candidate.addr).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
