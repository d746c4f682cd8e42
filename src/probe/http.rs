//! Application-layer probe: one HTTP(S) request sent straight to the
//! candidate address.
//!
//! Name resolution is bypassed by pinning the configured host to the
//! candidate for the lifetime of a throwaway client, so the TLS handshake
//! (SNI) and the `Host` header both carry the provider's canonical name
//! while the TCP connection goes to the candidate IP. Latency is wall-clock
//! time from sending the request to receiving the full body.

use super::{ProbeFailure, Prober};
use crate::config::{HttpProbeConfig, TlsPolicy};
use crate::models::Latency;
use colored::Colorize;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct HttpProber {
    settings: HttpProbeConfig,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(settings: HttpProbeConfig, timeout: Duration) -> HttpProber {
        if settings.tls.accepts_invalid_certs() {
            log::warn!(
                "HTTP probe {relaxed} for {host}: candidates are dialled by IP",
                relaxed = "accepts invalid certificates".yellow(),
                host = settings.host
            );
        }
        HttpProber { settings, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn tls(&self) -> TlsPolicy {
        self.settings.tls
    }

    /// Request URL. The port is only spelled out when it is not the scheme default.
    pub fn url(&self) -> String {
        let scheme = self.settings.scheme;
        if self.settings.port == scheme.default_port() {
            format!("{}://{}{}", scheme.as_str(), self.settings.host, self.settings.path)
        } else {
            format!(
                "{}://{}:{}{}",
                scheme.as_str(),
                self.settings.host,
                self.settings.port,
                self.settings.path
            )
        }
    }

    fn client(&self, addr: IpAddr) -> Result<reqwest::Client, ProbeFailure> {
        reqwest::Client::builder()
            .resolve(&self.settings.host, SocketAddr::new(addr, self.settings.port))
            .timeout(self.timeout)
            .no_proxy()
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(self.settings.tls.accepts_invalid_certs())
            .build()
            .map_err(|e| ProbeFailure::Transport(e.to_string()))
    }

    async fn measure(&self, addr: IpAddr) -> Result<Duration, ProbeFailure> {
        let client = self.client(addr)?;
        let transport = |e: reqwest::Error| {
            if e.is_timeout() {
                ProbeFailure::Timeout
            } else {
                ProbeFailure::Transport(e.to_string())
            }
        };

        let started = Instant::now();
        let response = client.get(self.url()).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProbeFailure::Status(status.as_u16()));
        }
        response.bytes().await.map_err(transport)?;
        Ok(started.elapsed())
    }
}

impl Prober for HttpProber {
    async fn probe(&self, addr: IpAddr) -> Latency {
        match self.measure(addr).await {
            Ok(elapsed) => Latency::from_duration(elapsed),
            Err(failure) => failure.unreachable(addr),
        }
    }
}
