//! ICMP echo probe through the platform ping tool.

use super::{ping_output, ProbeFailure, Prober};
use crate::models::Latency;
use std::net::IpAddr;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Runs `<command> -c <count> <addr>` (`-n` on Windows) under one overall
/// timeout and averages the round-trip times it prints.
#[derive(Debug, Clone)]
pub struct IcmpProber {
    command: String,
    count: u32,
    timeout: Duration,
}

impl IcmpProber {
    pub fn new(command: &str, count: u32, timeout: Duration) -> IcmpProber {
        IcmpProber {
            command: command.to_string(),
            count: count.max(1),
            timeout,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn args(&self, addr: IpAddr) -> Vec<String> {
        vec![
            count_flag().to_string(),
            self.count.to_string(),
            addr.to_string(),
        ]
    }

    /// Run the ping tool and return its stdout.
    async fn run(&self, addr: IpAddr) -> Result<String, ProbeFailure> {
        let args = self.args(addr);
        log::trace!("run({} {})", self.command, args.join(" "));

        let mut command = Command::new(&self.command);
        command
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ProbeFailure::Spawn {
                    command: self.command.clone(),
                    reason: e.to_string(),
                })
            }
            Err(_) => return Err(ProbeFailure::Timeout),
        };

        if !output.status.success() {
            log::trace!(
                "code={code:?} stderr={stderr}",
                code = output.status.code(),
                stderr = String::from_utf8_lossy(&output.stderr).trim()
            );
            return Err(ProbeFailure::ExitStatus(output.status.to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn measure(&self, addr: IpAddr) -> Result<f64, ProbeFailure> {
        let stdout = self.run(addr).await?;
        ping_output::parse_latency(&stdout).ok_or(ProbeFailure::NoSamples)
    }
}

impl Prober for IcmpProber {
    async fn probe(&self, addr: IpAddr) -> Latency {
        match self.measure(addr).await {
            Ok(ms) => Latency::millis(ms),
            Err(failure) => failure.unreachable(addr),
        }
    }
}

/// Echo count flag of the platform ping tool.
fn count_flag() -> &'static str {
    if cfg!(windows) {
        "-n"
    } else {
        "-c"
    }
}
