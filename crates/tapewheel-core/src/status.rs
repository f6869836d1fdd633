//! Per-target, per-archive and per-run outcome model.

use serde::{Deserialize, Serialize};

use crate::archive::Target;
use crate::rule::Rule;

/// Archive status as stored in the document `state.status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveStatus {
    Ok,
    Failed,
    #[default]
    None,
}

impl ArchiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Failed => "failed",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for ArchiveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened to a single target within an archive run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    /// The worker streamed the target and reported a byte count.
    Completed { bytes: u64 },
    /// Liveness pre-check failed; the worker was never invoked.
    Unreachable,
    /// The remote worker exited non-zero (or the transport itself failed).
    WorkerFailed { detail: String },
    /// The worker output carried no byte count.
    ParseFailed,
    /// The worker output contained the `killed:` marker.
    Killed,
}

impl TargetOutcome {
    /// Warn-level failures record the miss and move on to the next target.
    pub fn is_warn(&self) -> bool {
        matches!(self, Self::Unreachable)
    }

    /// Fatal-on-target failures mark the whole archive as failed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::WorkerFailed { .. } | Self::ParseFailed | Self::Killed
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

impl std::fmt::Display for TargetOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed { bytes } => write!(f, "completed ({} bytes)", bytes),
            Self::Unreachable => write!(f, "host unreachable"),
            Self::WorkerFailed { detail } => write!(f, "worker failed: {}", detail),
            Self::ParseFailed => write!(f, "no byte count in worker results"),
            Self::Killed => write!(f, "worker killed"),
        }
    }
}

/// One target paired with its outcome.
#[derive(Debug, Clone)]
pub struct TargetReport {
    pub target: Target,
    pub outcome: TargetOutcome,
}

/// Result of running one archive end to end.
#[derive(Debug, Clone)]
pub struct ArchiveOutcome {
    pub archive: String,
    pub rule: Rule,
    pub targets: Vec<TargetReport>,
    /// The canonical document could not be written back.
    pub save_failed: bool,
    /// The run was a calendar no-op (rule `none`, or monthly outside the
    /// first week).
    pub skipped: bool,
}

impl ArchiveOutcome {
    pub fn skipped(archive: impl Into<String>, rule: Rule) -> Self {
        Self {
            archive: archive.into(),
            rule,
            targets: Vec::new(),
            save_failed: false,
            skipped: true,
        }
    }

    /// True iff every target streamed successfully and state was saved.
    pub fn succeeded(&self) -> bool {
        if self.save_failed {
            return false;
        }
        self.skipped
            || (!self.targets.is_empty() && self.targets.iter().all(|t| t.outcome.is_success()))
    }
}

/// Aggregated outcomes of one manager run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub archives: Vec<ArchiveOutcome>,
}

impl RunReport {
    pub fn push(&mut self, outcome: ArchiveOutcome) {
        self.archives.push(outcome);
    }

    pub fn failed_count(&self) -> usize {
        self.archives.iter().filter(|a| !a.succeeded()).count()
    }

    pub fn any_save_failed(&self) -> bool {
        self.archives.iter().any(|a| a.save_failed)
    }

    pub fn all_ok(&self) -> bool {
        self.failed_count() == 0
    }

    /// One line per archive for the end-of-run log.
    pub fn summary(&self) -> String {
        self.archives
            .iter()
            .map(|a| {
                let state = if !a.succeeded() {
                    "failed"
                } else if a.skipped {
                    "skipped"
                } else {
                    "ok"
                };
                format!("{} [{}] {}", a.archive, a.rule, state)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
