//! Worker result parsing and the derived per-target log files.
//!
//! The archiver emits whitespace-separated tokens on stdout. The executor
//! looks for the literal token `bytes` and takes the value two tokens
//! later as the byte count; a `killed:` token anywhere marks the target as
//! killed. Two files are derived under the archive's `logDir`:
//!
//! - `<name>.<rule>.<setIndex>.results.log` — the raw tokens,
//! - `<name>.<rule>.<setIndex>.status.log` — label, completion timestamp
//!   and `totalBytesWritten`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tapewheel_core::Rule;
use tracing::debug;

/// Parsed worker output.
#[derive(Debug, Clone)]
pub struct WorkerResults {
    raw: String,
    tokens: Vec<String>,
}

impl WorkerResults {
    pub fn parse(raw: &str) -> Self {
        let tokens = raw.split_whitespace().map(str::to_string).collect();
        Self {
            raw: raw.to_string(),
            tokens,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The worker was killed mid-stream.
    pub fn killed(&self) -> bool {
        self.tokens.iter().any(|t| t == "killed:")
    }

    /// Byte count from the token two places after the literal `bytes`.
    pub fn total_bytes(&self) -> Option<u64> {
        let at = self.tokens.iter().position(|t| t == "bytes")?;
        self.tokens.get(at + 2)?.parse().ok()
    }
}

/// Paths of the two derived log files for one target run.
pub fn log_paths(log_dir: &str, name: &str, rule: Rule, set_index: u32) -> (PathBuf, PathBuf) {
    let base = Path::new(log_dir);
    (
        base.join(format!("{name}.{rule}.{set_index}.results.log")),
        base.join(format!("{name}.{rule}.{set_index}.status.log")),
    )
}

/// Write the results and status logs for one completed target.
pub async fn write_target_logs(
    log_dir: &str,
    name: &str,
    rule: Rule,
    set_index: u32,
    label: &str,
    results: &WorkerResults,
    completed_at: DateTime<Utc>,
) -> std::io::Result<()> {
    tokio::fs::create_dir_all(log_dir).await?;
    let (results_path, status_path) = log_paths(log_dir, name, rule, set_index);

    tokio::fs::write(&results_path, results.raw()).await?;

    let bytes = results
        .total_bytes()
        .map(|b| b.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let status = format!(
        "label: {label}\ncompleted: {}\ntotalBytesWritten: {bytes}\n",
        completed_at.to_rfc3339()
    );
    tokio::fs::write(&status_path, status).await?;

    debug!("wrote {} and {}", results_path.display(), status_path.display());
    Ok(())
}
