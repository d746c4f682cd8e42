//! Run configuration.
//!
//! [`Config`] carries every tunable of a run: where the range lists come
//! from, where the shortlists go, which probe strategy to use and how hard
//! to push it. [`Config::load`] starts from the defaults (or a JSON file named
//! by `CFIP_CONFIG`) and applies `CFIP_*` environment overrides on top.

use crate::error::PipelineError;
use crate::models::Family;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_FILE_VAR: &str = "CFIP_CONFIG";

/// Overall command timeout for one ICMP probe (all echo requests).
pub const DEFAULT_ICMP_TIMEOUT_MS: u64 = 10_000;
/// Request timeout for one HTTP probe.
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5_000;

/// Which probe measures latency. Only one is active per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Echo requests through the platform ping tool.
    #[default]
    Icmp,
    /// One HTTP(S) request straight to the candidate address.
    Http,
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "icmp" | "ping" => Ok(StrategyKind::Icmp),
            "http" | "https" => Ok(StrategyKind::Http),
            other => Err(format!("unknown probe strategy '{other}' (expected icmp or http)")),
        }
    }
}

/// Certificate handling for the HTTP probe.
///
/// Candidates are dialled by IP, so their certificates are not guaranteed
/// to match the canonical host. `AcceptInvalidCerts` turns verification off
/// for the probe client only; the range fetch always verifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsPolicy {
    Verify,
    AcceptInvalidCerts,
}

impl TlsPolicy {
    pub fn accepts_invalid_certs(self) -> bool {
        self == TlsPolicy::AcceptInvalidCerts
    }
}

impl FromStr for TlsPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "verify" | "strict" => Ok(TlsPolicy::Verify),
            "accept_invalid_certs" | "relaxed" | "insecure" => Ok(TlsPolicy::AcceptInvalidCerts),
            other => Err(format!("unknown TLS policy '{other}' (expected verify or relaxed)")),
        }
    }
}

/// What to do with lines in a range list that are not valid CIDR blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidRangePolicy {
    /// Log each rejected line at warn level.
    #[default]
    Warn,
    /// Only count them (logged at debug).
    Silent,
}

impl FromStr for InvalidRangePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "warn" | "log" => Ok(InvalidRangePolicy::Warn),
            "silent" | "quiet" => Ok(InvalidRangePolicy::Silent),
            other => Err(format!("unknown invalid-range policy '{other}' (expected warn or silent)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// Target of the HTTP probe: the provider's canonical host and a path it
/// always serves. Requests go to the candidate IP with this host name in
/// SNI and the `Host` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpProbeConfig {
    pub host: String,
    pub path: String,
    pub port: u16,
    pub scheme: Scheme,
    pub tls: TlsPolicy,
}

impl Default for HttpProbeConfig {
    fn default() -> Self {
        HttpProbeConfig {
            host: "www.cloudflare.com".to_string(),
            path: "/cdn-cgi/trace".to_string(),
            port: 443,
            scheme: Scheme::Https,
            tls: TlsPolicy::AcceptInvalidCerts,
        }
    }
}

/// Source list and output file for one protocol family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyConfig {
    pub source_url: String,
    pub output_path: PathBuf,
}

impl FamilyConfig {
    pub fn ipv4() -> FamilyConfig {
        FamilyConfig {
            source_url: "https://www.cloudflare.com/ips-v4".to_string(),
            output_path: PathBuf::from("cfipv4.txt"),
        }
    }

    pub fn ipv6() -> FamilyConfig {
        FamilyConfig {
            source_url: "https://www.cloudflare.com/ips-v6".to_string(),
            output_path: PathBuf::from("cfipv6.txt"),
        }
    }
}

/// A family block as written in a config file; absent fields fall back to
/// the family's own defaults.
#[derive(Deserialize)]
struct PartialFamily {
    source_url: Option<String>,
    output_path: Option<PathBuf>,
}

impl PartialFamily {
    fn or(self, defaults: FamilyConfig) -> FamilyConfig {
        FamilyConfig {
            source_url: self.source_url.unwrap_or(defaults.source_url),
            output_path: self.output_path.unwrap_or(defaults.output_path),
        }
    }
}

fn ipv4_family<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FamilyConfig, D::Error> {
    Ok(PartialFamily::deserialize(deserializer)?.or(FamilyConfig::ipv4()))
}

fn ipv6_family<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FamilyConfig, D::Error> {
    Ok(PartialFamily::deserialize(deserializer)?.or(FamilyConfig::ipv6()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(deserialize_with = "ipv4_family")]
    pub ipv4: FamilyConfig,
    #[serde(deserialize_with = "ipv6_family")]
    pub ipv6: FamilyConfig,
    pub strategy: StrategyKind,
    /// Probes in flight at once, per family.
    pub workers: usize,
    /// Length cap of each shortlist.
    pub top_n: usize,
    pub fetch_timeout_ms: u64,
    /// Overrides the strategy's own default when set.
    pub probe_timeout_ms: Option<u64>,
    /// Echo requests per ICMP probe.
    pub ping_count: u32,
    pub ping_command: String,
    pub http: HttpProbeConfig,
    pub invalid_ranges: InvalidRangePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ipv4: FamilyConfig::ipv4(),
            ipv6: FamilyConfig::ipv6(),
            strategy: StrategyKind::Icmp,
            workers: 20,
            top_n: 20,
            fetch_timeout_ms: 10_000,
            probe_timeout_ms: None,
            ping_count: 4,
            ping_command: "ping".to_string(),
            http: HttpProbeConfig::default(),
            invalid_ranges: InvalidRangePolicy::Warn,
        }
    }
}

impl Config {
    /// Build the configuration for this process: `.env`, then the optional
    /// JSON file named by `CFIP_CONFIG`, then `CFIP_*` variables.
    pub fn load() -> Result<Config, PipelineError> {
        dotenv::dotenv().ok();

        let mut config = match std::env::var(CONFIG_FILE_VAR) {
            Ok(path) => {
                log::info!("Using config file: {path}");
                Config::from_json_file(Path::new(&path))?
            }
            Err(_) => Config::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config.normalized())
    }

    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Config, PipelineError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Config::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Config, PipelineError> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let config: Config = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
            PipelineError::Config(format!("path={} error={}", e.path(), e.inner()))
        })?;
        Ok(config.normalized())
    }

    /// Apply `CFIP_*` overrides. `lookup` returns the value of a variable,
    /// if set; empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("CFIP_STRATEGY") {
            self.strategy = parse_var("CFIP_STRATEGY", &v)?;
        }
        if let Some(v) = get("CFIP_WORKERS") {
            self.workers = parse_var("CFIP_WORKERS", &v)?;
        }
        if let Some(v) = get("CFIP_TOP_N") {
            self.top_n = parse_var("CFIP_TOP_N", &v)?;
        }
        if let Some(v) = get("CFIP_PROBE_TIMEOUT_MS") {
            self.probe_timeout_ms = Some(parse_var("CFIP_PROBE_TIMEOUT_MS", &v)?);
        }
        if let Some(v) = get("CFIP_PING_COUNT") {
            self.ping_count = parse_var("CFIP_PING_COUNT", &v)?;
        }
        if let Some(v) = get("CFIP_PING_COMMAND") {
            self.ping_command = v;
        }
        if let Some(v) = get("CFIP_IPV4_URL") {
            self.ipv4.source_url = v;
        }
        if let Some(v) = get("CFIP_IPV6_URL") {
            self.ipv6.source_url = v;
        }
        if let Some(v) = get("CFIP_IPV4_OUTPUT") {
            self.ipv4.output_path = PathBuf::from(v);
        }
        if let Some(v) = get("CFIP_IPV6_OUTPUT") {
            self.ipv6.output_path = PathBuf::from(v);
        }
        if let Some(v) = get("CFIP_HTTP_HOST") {
            self.http.host = v;
        }
        if let Some(v) = get("CFIP_HTTP_PATH") {
            self.http.path = v;
        }
        if let Some(v) = get("CFIP_HTTP_PORT") {
            self.http.port = parse_var("CFIP_HTTP_PORT", &v)?;
        }
        if let Some(v) = get("CFIP_TLS") {
            self.http.tls = parse_var("CFIP_TLS", &v)?;
        }
        if let Some(v) = get("CFIP_INVALID_RANGES") {
            self.invalid_ranges = parse_var("CFIP_INVALID_RANGES", &v)?;
        }
        Ok(())
    }

    /// Clamp values that would stall or abort a run.
    pub fn normalized(mut self) -> Config {
        self.workers = self.workers.clamp(1, Semaphore::MAX_PERMITS);
        self.ping_count = self.ping_count.max(1);
        if !self.http.path.starts_with('/') {
            self.http.path.insert(0, '/');
        }
        self
    }

    pub fn family(&self, family: Family) -> &FamilyConfig {
        match family {
            Family::V4 => &self.ipv4,
            Family::V6 => &self.ipv6,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Per-probe timeout: the explicit override, else the strategy default.
    pub fn probe_timeout(&self) -> Duration {
        let ms = self.probe_timeout_ms.unwrap_or(match self.strategy {
            StrategyKind::Icmp => DEFAULT_ICMP_TIMEOUT_MS,
            StrategyKind::Http => DEFAULT_HTTP_TIMEOUT_MS,
        });
        Duration::from_millis(ms)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, PipelineError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| PipelineError::Config(format!("{key}='{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.strategy, StrategyKind::Icmp);
        assert_eq!(config.workers, 20);
        assert_eq!(config.top_n, 20);
        assert_eq!(config.ipv4.output_path, PathBuf::from("cfipv4.txt"));
        assert_eq!(config.ipv6.output_path, PathBuf::from("cfipv6.txt"));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(config.probe_timeout(), Duration::from_secs(10));
        assert_eq!(config.http.tls, TlsPolicy::AcceptInvalidCerts);
    }

    #[test]
    fn test_probe_timeout_follows_strategy() {
        let mut config = Config {
            strategy: StrategyKind::Http,
            ..Config::default()
        };
        assert_eq!(config.probe_timeout(), Duration::from_secs(5));
        config.probe_timeout_ms = Some(750);
        assert_eq!(config.probe_timeout(), Duration::from_millis(750));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                ("CFIP_STRATEGY", "HTTP"),
                ("CFIP_WORKERS", "35"),
                ("CFIP_TOP_N", "10"),
                ("CFIP_IPV6_OUTPUT", "/tmp/v6.txt"),
                ("CFIP_TLS", "verify"),
                ("CFIP_INVALID_RANGES", "silent"),
                ("CFIP_PING_COUNT", ""),
            ]))
            .expect("overrides should apply");
        assert_eq!(config.strategy, StrategyKind::Http);
        assert_eq!(config.workers, 35);
        assert_eq!(config.top_n, 10);
        assert_eq!(config.ipv6.output_path, PathBuf::from("/tmp/v6.txt"));
        assert_eq!(config.http.tls, TlsPolicy::Verify);
        assert_eq!(config.invalid_ranges, InvalidRangePolicy::Silent);
        assert_eq!(config.ping_count, 4, "empty value must be ignored");
    }

    #[test]
    fn test_apply_overrides_rejects_garbage() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(lookup_from(&[("CFIP_WORKERS", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("CFIP_WORKERS"), "got: {err}");

        let err = config
            .apply_overrides(lookup_from(&[("CFIP_STRATEGY", "carrier-pigeon")]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_from_json_partial() {
        let config = Config::from_json(
            r#"{ "strategy": "http", "top_n": 5, "workers": 0,
                 "ipv4": { "source_url": "http://127.0.0.1/v4", "output_path": "out/v4.txt" } }"#,
        )
        .expect("valid json config");
        assert_eq!(config.strategy, StrategyKind::Http);
        assert_eq!(config.top_n, 5);
        assert_eq!(config.workers, 1, "zero workers is clamped");
        assert_eq!(config.ipv4.source_url, "http://127.0.0.1/v4");
        assert_eq!(config.ipv6, Config::default().ipv6);
    }

    #[test]
    fn test_from_json_reports_path() {
        let err = Config::from_json(r#"{ "http": { "host": "h", "path": "/", "port": "x", "tls": "verify" } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("http.port"), "got: {err}");
    }

    #[test]
    fn test_normalized_path_gets_slash() {
        let mut config = Config::default();
        config.http.path = "cdn-cgi/trace".to_string();
        assert_eq!(config.normalized().http.path, "/cdn-cgi/trace");
    }

    #[test]
    fn test_normalized_caps_workers() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[("CFIP_WORKERS", "18446744073709551615")]))
            .expect("usize::MAX parses");
        let config = config.normalized();
        assert_eq!(config.workers, Semaphore::MAX_PERMITS);
        assert_eq!(crate::processing::WorkerPool::new(config.workers).capacity(), config.workers);

        let config = Config::from_json(r#"{ "workers": 18446744073709551615 }"#).expect("valid json");
        assert_eq!(config.workers, Semaphore::MAX_PERMITS);
    }

    #[test]
    fn test_from_json_partial_blocks_keep_defaults() {
        let config = Config::from_json(
            r#"{ "http": { "tls": "verify" }, "ipv6": { "output_path": "out/v6.txt" } }"#,
        )
        .expect("partial blocks are accepted");
        assert_eq!(config.http.tls, TlsPolicy::Verify);
        assert_eq!(config.http.host, "www.cloudflare.com");
        assert_eq!(config.http.path, "/cdn-cgi/trace");
        assert_eq!(config.http.port, 443);
        assert_eq!(config.ipv6.output_path, PathBuf::from("out/v6.txt"));
        assert_eq!(config.ipv6.source_url, FamilyConfig::ipv6().source_url);
        assert_eq!(config.ipv4, FamilyConfig::ipv4());
    }
}
