//! Target liveness pre-check.
//!
//! Before any worker is invoked the manager sends three ICMP echo requests
//! to the target host. A host that answers none of them is recorded as a
//! warn-level miss and skipped; the rest of the archive continues.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::warn;

/// Number of echo requests per probe.
pub const PROBE_COUNT: u32 = 3;

/// Liveness seam; the real prober shells out to `ping`.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn is_alive(&self, host: &str) -> bool;
}

/// ICMP prober backed by the system `ping` binary.
#[derive(Debug, Clone)]
pub struct IcmpProber {
    pub binary: String,
    pub timeout_secs: u32,
}

impl Default for IcmpProber {
    fn default() -> Self {
        Self {
            binary: "ping".to_string(),
            timeout_secs: 5,
        }
    }
}

#[async_trait]
impl Prober for IcmpProber {
    async fn is_alive(&self, host: &str) -> bool {
        let status = Command::new(&self.binary)
            .arg("-c")
            .arg(PROBE_COUNT.to_string())
            .arg("-W")
            .arg(self.timeout_secs.to_string())
            .arg(host)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await;

        match status {
            Ok(status) => status.success(),
            Err(e) => {
                warn!("could not spawn {} for {}: {}", self.binary, host, e);
                false
            }
        }
    }
}
