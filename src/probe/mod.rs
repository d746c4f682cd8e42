//! Latency probes.
//!
//! A [`Prober`] turns one candidate address into a [`Latency`]. Two
//! strategies exist and exactly one is used per run:
//! - [`icmp`] - echo requests through the platform ping tool
//! - [`http`] - one HTTP(S) request to the address, presenting the provider's host name
//!
//! Probes never fail outward: every [`ProbeFailure`] is logged at debug level
//! and reported as [`Latency::Unreachable`].

pub mod http;
pub mod icmp;
pub mod ping_output;

use crate::config::{Config, StrategyKind};
use crate::models::Latency;
use std::future::Future;
use std::net::IpAddr;
use thiserror::Error;

pub use http::HttpProber;
pub use icmp::IcmpProber;

/// Measures one address. Implementations hold no mutable state, so one
/// prober is shared by every task of a run.
pub trait Prober: Send + Sync {
    fn probe(&self, addr: IpAddr) -> impl Future<Output = Latency> + Send;
}

/// Why a probe produced no measurement.
#[derive(Debug, Error)]
pub enum ProbeFailure {
    #[error("failed to start {command}: {reason}")]
    Spawn { command: String, reason: String },
    #[error("timed out")]
    Timeout,
    #[error("exited with {0}")]
    ExitStatus(String),
    #[error("no round-trip times in output")]
    NoSamples,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP status {0}")]
    Status(u16),
}

impl ProbeFailure {
    /// Log the failure and collapse it to the unreachable sentinel.
    pub(crate) fn unreachable(self, addr: IpAddr) -> Latency {
        log::debug!("probe {addr}: {self}");
        Latency::Unreachable
    }
}

/// The strategy selected by configuration.
#[derive(Debug)]
pub enum ProbeStrategy {
    Icmp(IcmpProber),
    Http(HttpProber),
}

impl ProbeStrategy {
    pub fn from_config(config: &Config) -> ProbeStrategy {
        match config.strategy {
            StrategyKind::Icmp => ProbeStrategy::Icmp(IcmpProber::new(
                &config.ping_command,
                config.ping_count,
                config.probe_timeout(),
            )),
            StrategyKind::Http => {
                ProbeStrategy::Http(HttpProber::new(config.http.clone(), config.probe_timeout()))
            }
        }
    }
}

impl Prober for ProbeStrategy {
    async fn probe(&self, addr: IpAddr) -> Latency {
        match self {
            ProbeStrategy::Icmp(prober) => prober.probe(addr).await,
            ProbeStrategy::Http(prober) => prober.probe(addr).await,
        }
    }
}
