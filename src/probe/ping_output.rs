//! Round-trip time extraction from ping tool output.
//!
//! Ping output is not a stable format, so this recognises three shapes, in
//! order of preference:
//!
//! 1. Per-reply lines. All samples are averaged.
//!    - iputils / BusyBox (Linux): `64 bytes from 1.1.1.1: icmp_seq=1 ttl=57 time=11.8 ms`
//!    - BSD / macOS: `64 bytes from 1.1.1.1: icmp_seq=0 ttl=57 time=11.812 ms`
//!    - Windows: `Reply from 1.1.1.1: bytes=32 time=12ms TTL=57`, or `time<1ms`
//!      which counts as a 1 ms sample.
//! 2. Unix summary line, average field:
//!    - iputils: `rtt min/avg/max/mdev = 11.553/11.803/12.041/0.199 ms`
//!    - macOS: `round-trip min/avg/max/stddev = 11.5/11.8/12.0/0.2 ms`
//!    - BusyBox: `round-trip min/avg/max = 11.5/11.8/12.0 ms`
//! 3. Windows summary line: `Minimum = 11ms, Maximum = 12ms, Average = 11ms`.
//!
//! Anything else yields no measurement.

use regex::Regex;
use std::sync::OnceLock;

static REPLY_REGEX: OnceLock<Regex> = OnceLock::new();
static SUMMARY_REGEX: OnceLock<Regex> = OnceLock::new();
static WINDOWS_AVERAGE_REGEX: OnceLock<Regex> = OnceLock::new();

fn reply_regex() -> &'static Regex {
    REPLY_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\btime\s*[=<]\s*([0-9]+(?:\.[0-9]+)?)\s*ms\b").expect("Invalid Regex")
    })
}

fn summary_regex() -> &'static Regex {
    SUMMARY_REGEX.get_or_init(|| {
        Regex::new(
            r"(?i)min/avg/max(?:/[a-z]+)?\s*=\s*([0-9]+(?:\.[0-9]+)?)/([0-9]+(?:\.[0-9]+)?)/([0-9]+(?:\.[0-9]+)?)",
        )
        .expect("Invalid Regex")
    })
}

fn windows_average_regex() -> &'static Regex {
    WINDOWS_AVERAGE_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\bAverage\s*=\s*([0-9]+(?:\.[0-9]+)?)\s*ms").expect("Invalid Regex")
    })
}

/// Average round-trip time in milliseconds, if the output contains any.
pub fn parse_latency(output: &str) -> Option<f64> {
    let samples = reply_samples(output);
    if !samples.is_empty() {
        return Some(samples.iter().sum::<f64>() / samples.len() as f64);
    }
    summary_average(output).or_else(|| windows_average(output))
}

/// Every per-reply round-trip time in the output.
pub fn reply_samples(output: &str) -> Vec<f64> {
    reply_regex()
        .captures_iter(output)
        .filter_map(|caps| caps[1].parse::<f64>().ok())
        .collect()
}

/// The `avg` field of a Unix `min/avg/max` summary line.
pub fn summary_average(output: &str) -> Option<f64> {
    summary_regex()
        .captures(output)
        .and_then(|caps| caps[2].parse().ok())
}

/// The `Average = Nms` field of a Windows summary.
pub fn windows_average(output: &str) -> Option<f64> {
    windows_average_regex()
        .captures(output)
        .and_then(|caps| caps[1].parse().ok())
}
