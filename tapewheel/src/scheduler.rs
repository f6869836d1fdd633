//! Run dispatch: discover archives, order them, run them one by one.
//!
//! Archives run strictly sequentially. The run order is today's resolved
//! rule mapped through `{none:0, daily:1, weekly:2, monthly:3}`, ascending,
//! with discovery order breaking ties, so the cheap daily work finishes
//! before the operator-attention tape runs.

use std::path::PathBuf;

use tapewheel_core::archive::ArchiveRecord;
use tapewheel_core::persist;
use tapewheel_core::status::RunReport;
use tracing::{info, warn};

use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::executor::ArchiveExecutor;
use crate::notifier::Notifier;
use crate::ping::Prober;
use crate::sink::TapeControl;
use crate::transport::RemoteShell;

pub struct Scheduler<'a> {
    ctx: &'a RunContext,
    remote: &'a dyn RemoteShell,
    prober: &'a dyn Prober,
    tape: &'a dyn TapeControl,
    notifier: &'a Notifier<'a>,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        ctx: &'a RunContext,
        remote: &'a dyn RemoteShell,
        prober: &'a dyn Prober,
        tape: &'a dyn TapeControl,
        notifier: &'a Notifier<'a>,
    ) -> Self {
        Self {
            ctx,
            remote,
            prober,
            tape,
            notifier,
        }
    }

    /// Run every due archive and aggregate the outcome.
    pub async fn run(&self) -> Result<RunReport> {
        if !self.ctx.config_dir.is_dir() {
            return Err(Error::DirNotFound(self.ctx.config_dir.clone()));
        }

        let run_list = self.collect()?;
        if run_list.is_empty() {
            info!("no archives to run");
            return Ok(RunReport::default());
        }

        let executor = ArchiveExecutor::new(
            self.ctx,
            self.remote,
            self.prober,
            self.tape,
            self.notifier,
        );

        let mut report = RunReport::default();
        for (path, mut record) in run_list {
            let outcome = executor.run_archive(&mut record, &path).await;
            if !outcome.succeeded() {
                warn!("archive {} failed", outcome.archive);
            }
            report.push(outcome);
        }
        Ok(report)
    }

    /// Translate a finished report into the process result.
    pub fn aggregate(&self, report: &RunReport) -> Result<()> {
        if report.any_save_failed() {
            let archive = report
                .archives
                .iter()
                .find(|a| a.save_failed)
                .map(|a| a.archive.clone())
                .unwrap_or_default();
            return Err(Error::StateSave {
                path: archive,
                reason: "canonical document not updated".into(),
            });
        }
        let failed = report.failed_count();
        if failed > 0 {
            return Err(Error::BackupFailed {
                failed,
                total: report.archives.len(),
            });
        }
        Ok(())
    }

    /// Discover, load and order the archives for this run.
    fn collect(&self) -> Result<Vec<(PathBuf, ArchiveRecord)>> {
        let discovery = persist::discover(&self.ctx.config_dir)?;
        for stem in &discovery.conflicts {
            warn!(
                "archive '{}' has both a legacy and a YAML document, skipping",
                stem
            );
        }

        let mut records = Vec::new();
        for path in discovery.documents {
            let record = match persist::load(&path).and_then(|r| r.validate().map(|_| r)) {
                Ok(record) => record,
                Err(e) => {
                    // A malformed document never aborts the whole run.
                    warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            records.push((path, record));
        }

        if let Some(filter) = &self.ctx.archive_filter {
            records.retain(|(_, r)| r.name() == filter);
            if records.is_empty() {
                return Err(Error::ArchiveNotFound(filter.clone()));
            }
        }

        // Stable sort keeps discovery order within equal priorities.
        records.sort_by_key(|(_, r)| {
            r.resolved_rule(self.ctx.weekday, self.ctx.forced_rule)
                .run_priority()
        });

        info!(
            "run list: {}",
            records
                .iter()
                .map(|(_, r)| r.name().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(records)
    }
}
