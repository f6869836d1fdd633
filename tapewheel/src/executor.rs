//! Per-archive execution pipeline.
//!
//! One archive runs end to end here: resolve today's rule, gate monthly
//! runs to the first week, then stream every target in document order
//! through the worker, collecting per-target outcomes. State is committed
//! to the canonical document only when every target succeeded; a failed
//! run diverts the mutated record to an error document and leaves the
//! canonical one untouched.

use std::path::Path;

use chrono::Utc;
use tapewheel_core::archive::{ArchiveRecord, Target};
use tapewheel_core::label::{build_label, label_stem, DEFAULT_MAX_LABEL_LEN};
use tapewheel_core::persist::{error_document_path, store_yaml, LEGACY_EXTENSION};
use tapewheel_core::rule::can_do_monthly;
use tapewheel_core::status::{ArchiveOutcome, TargetOutcome, TargetReport};
use tapewheel_core::{ArchiveStatus, Rule};
use tracing::{info, warn};

use crate::context::RunContext;
use crate::error::Error;
use crate::notifier::Notifier;
use crate::ping::Prober;
use crate::results::{write_target_logs, WorkerResults};
use crate::sink::{self, Destination, TapeControl};
use crate::transport::{join_escaped, RemoteShell};
use crate::worker;

pub struct ArchiveExecutor<'a> {
    ctx: &'a RunContext,
    remote: &'a dyn RemoteShell,
    prober: &'a dyn Prober,
    tape: &'a dyn TapeControl,
    notifier: &'a Notifier<'a>,
}

impl<'a> ArchiveExecutor<'a> {
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

    /// Run one archive and persist its record.
    pub async fn run_archive(
        &self,
        record: &mut ArchiveRecord,
        doc_path: &Path,
    ) -> ArchiveOutcome {
        let rule = record.resolved_rule(self.ctx.weekday, self.ctx.forced_rule);
        record.state.current_rule = rule;

        if !rule.is_active() {
            info!("{}: nothing scheduled today", record.name());
            return self.finish_skipped(record, doc_path, rule);
        }

        if rule == Rule::Monthly
            && self.ctx.forced_rule.is_none()
            && !can_do_monthly(self.ctx.day_of_month())
        {
            info!(
                "{}: monthly run refused on day {} (first week only)",
                record.name(),
                self.ctx.day_of_month()
            );
            return self.finish_skipped(record, doc_path, rule);
        }

        self.notifier.preflight(record).await;

        let dest = Destination::parse(&record.storage.remote_device);
        if let Err(e) = sink::ensure_destination(&dest).await {
            warn!("{}: destination {} unusable: {}", record.name(), dest, e);
            record.state.status = ArchiveStatus::Failed;
            self.persist(record, doc_path, false);
            return ArchiveOutcome {
                archive: record.name().to_string(),
                rule,
                targets: Vec::new(),
                save_failed: false,
                skipped: false,
            };
        }
        let total_sets = record.total_sets(rule);
        let set_index = record.state.current_set.peek_next(rule, total_sets);
        let inc_reset = rule != Rule::Monthly && record.incremental_reset(self.ctx.today);

        info!(
            "{}: {} run to {} set {}{}",
            record.name(),
            rule,
            dest,
            set_index,
            if inc_reset { " (incremental reset)" } else { "" }
        );

        let targets = record.targets.0.clone();
        let mut reports = Vec::with_capacity(targets.len());
        for target in &targets {
            let outcome = self
                .run_target(record, target, rule, set_index, inc_reset, &dest)
                .await;
            if !outcome.is_success() {
                let context = format!("archiving {}", target);
                self.notifier
                    .on_archive_error(record, &context, &target_error(target, &outcome).to_string())
                    .await;
            }
            reports.push(TargetReport {
                target: target.clone(),
                outcome,
            });
        }

        let all_ok = !reports.is_empty() && reports.iter().all(|r| r.outcome.is_success());
        let mut save_failed = false;

        if all_ok {
            record.state.current_set.advance(rule, total_sets);
            record.state.status = ArchiveStatus::Ok;
            if dest.is_device() {
                if let Err(e) = self.tape.offline(&dest).await {
                    warn!("{}: offline after success failed: {}", record.name(), e);
                }
            }
            self.notifier.notify_tomorrow(record, self.ctx).await;
            save_failed = !self.persist(record, doc_path, true);
        } else {
            record.state.status = ArchiveStatus::Failed;
            // The canonical document keeps its pre-run state; the mutated
            // record goes to the error document for inspection.
            self.persist(record, doc_path, false);
        }

        ArchiveOutcome {
            archive: record.name().to_string(),
            rule,
            targets: reports,
            save_failed,
            skipped: false,
        }
    }

    /// One target: liveness, rewind, state-file staging, the worker run,
    /// result parsing and the per-target logs.
    async fn run_target(
        &self,
        record: &mut ArchiveRecord,
        target: &Target,
        rule: Rule,
        set_index: u32,
        inc_reset: bool,
        dest: &Destination,
    ) -> TargetOutcome {
        if !self.prober.is_alive(&target.host).await {
            warn!("{}: {} unreachable, skipping target", record.name(), target);
            return TargetOutcome::Unreachable;
        }

        if let Err(e) = self.tape.rewind(dest).await {
            return TargetOutcome::WorkerFailed {
                detail: format!("rewind failed: {e}"),
            };
        }

        self.notifier.on_archive_start(record, target).await;

        let label = build_label(
            record.name(),
            &target.host,
            &target.path,
            rule,
            self.ctx.today,
            DEFAULT_MAX_LABEL_LEN,
        );
        let plan = worker::plan(record, target, &label, rule, inc_reset);

        for staging in &plan.staging {
            match self
                .remote
                .run(&target.host, &record.manager.user, record.manager.port, staging)
                .await
            {
                Ok(output) if output.success() => {}
                Ok(output) => {
                    return TargetOutcome::WorkerFailed {
                        detail: format!(
                            "state-file staging exited {:?}: {}",
                            output.exit_code,
                            output.stderr.trim()
                        ),
                    };
                }
                Err(e) => {
                    return TargetOutcome::WorkerFailed {
                        detail: format!("state-file staging: {e}"),
                    };
                }
            }
        }

        record.state.command = join_escaped(&plan.argv);

        let output = match self
            .remote
            .run(&target.host, &record.manager.user, record.manager.port, &plan.argv)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                return TargetOutcome::WorkerFailed {
                    detail: e.to_string(),
                }
            }
        };
        if !output.success() {
            return TargetOutcome::WorkerFailed {
                detail: format!(
                    "worker exited {:?}: {}",
                    output.exit_code,
                    output.stderr.trim()
                ),
            };
        }

        let results = WorkerResults::parse(&output.stdout);
        if results.killed() {
            return TargetOutcome::Killed;
        }
        let Some(bytes) = results.total_bytes() else {
            return TargetOutcome::ParseFailed;
        };

        let completed_at = Utc::now();
        if let Err(e) = write_target_logs(
            &record.storage.log_dir,
            record.name(),
            rule,
            set_index,
            &label,
            &results,
            completed_at,
        )
        .await
        {
            warn!("{}: could not write target logs: {}", record.name(), e);
        }

        record.state.archive_date = Some(completed_at);
        let stem = label_stem(record.name(), &target.host, &target.path, rule);
        info!(
            "{}: {} done, {} bytes -> {}",
            record.name(),
            target,
            bytes,
            dest.effective_path(&stem, self.ctx.weekday).display()
        );
        TargetOutcome::Completed { bytes }
    }

    /// Persist the record after a no-op day (rule `none` or a refused
    /// monthly): only `currentRule` moved, counters and status are as
    /// they were.
    fn finish_skipped(
        &self,
        record: &mut ArchiveRecord,
        doc_path: &Path,
        rule: Rule,
    ) -> ArchiveOutcome {
        let save_failed = !self.persist(record, doc_path, true);
        ArchiveOutcome {
            save_failed,
            ..ArchiveOutcome::skipped(record.name(), rule)
        }
    }

    /// Write the record to its canonical document (`canonical == true`) or
    /// divert it to the error document. Returns whether the write stuck.
    ///
    /// A record loaded from a legacy document is migrated on its first
    /// commit: the state lands in a sibling `.yml` document and the
    /// legacy original is removed, so the next discovery sees exactly one
    /// format.
    fn persist(&self, record: &ArchiveRecord, doc_path: &Path, canonical: bool) -> bool {
        let path = if canonical {
            canonical_path(doc_path)
        } else {
            if let Err(e) = std::fs::create_dir_all(&record.storage.log_dir) {
                warn!("cannot create {}: {}", record.storage.log_dir, e);
            }
            error_document_path(&record.storage.log_dir, record.name())
        };
        match store_yaml(record, &path) {
            Ok(()) => {
                if canonical && path != doc_path {
                    if let Err(e) = std::fs::remove_file(doc_path) {
                        warn!(
                            "migrated {} but could not remove it: {}",
                            doc_path.display(),
                            e
                        );
                    }
                }
                true
            }
            Err(e) => {
                warn!("cannot write {}: {}", path.display(), e);
                if canonical {
                    // Keep the evidence: divert the mutated record next to
                    // the run logs instead of losing it.
                    let diverted = error_document_path(&record.storage.log_dir, record.name());
                    if let Err(e) = store_yaml(record, &diverted) {
                        warn!("cannot divert to {}: {}", diverted.display(), e);
                    }
                }
                false
            }
        }
    }
}

/// The path a record commits to: its own document, or the YAML sibling
/// when it was imported from a legacy document.
fn canonical_path(doc_path: &Path) -> std::path::PathBuf {
    match doc_path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext == LEGACY_EXTENSION => doc_path.with_extension("yml"),
        _ => doc_path.to_path_buf(),
    }
}

/// Map a failed target outcome onto the error taxonomy for the operator-
/// visible error block.
fn target_error(target: &Target, outcome: &TargetOutcome) -> Error {
    match outcome {
        TargetOutcome::Unreachable => Error::PingHost(target.host.clone()),
        TargetOutcome::Killed => Error::WorkerKilled {
            target: target.to_string(),
        },
        TargetOutcome::ParseFailed => Error::ParseResults {
            target: target.to_string(),
        },
        TargetOutcome::WorkerFailed { detail } => {
            Error::transport(target.host.as_str(), detail.clone())
        }
        TargetOutcome::Completed { .. } => {
            Error::transport(target.host.as_str(), "unexpected success")
        }
    }
}
