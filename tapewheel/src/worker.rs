//! On-client archiver invocation.
//!
//! For each target the manager resolves the worker installation paths
//! (per-host override, then the `default` entry), prepares the incremental
//! state files for the resolved tier, and runs the archiver with an
//! explicit argv carrying the full streaming contract.

use tapewheel_core::archive::{ArchiveRecord, Target};
use tapewheel_core::label::state_file_name;
use tapewheel_core::Rule;

/// Name of the archiver binary inside the worker's `scriptDir`.
pub const AGENT_BINARY: &str = "tw-agent";

/// Parameters of one worker invocation.
#[derive(Debug, Clone)]
pub struct WorkerPlan {
    /// Archiver argv to run on the client.
    pub argv: Vec<String>,
    /// State-file staging argvs to run on the client before streaming.
    pub staging: Vec<Vec<String>>,
}

/// Build the full invocation plan for one target.
pub fn plan(record: &ArchiveRecord, target: &Target, label: &str, rule: Rule, inc_reset: bool) -> WorkerPlan {
    WorkerPlan {
        argv: build_worker_argv(record, target, label, rule, inc_reset),
        staging: state_file_commands(record, target, rule, inc_reset),
    }
}

/// The archiver command for one target, as an explicit argv vector.
///
/// Verbose output is suppressed on monthly runs; a full base listing every
/// file would drown the logs.
pub fn build_worker_argv(
    record: &ArchiveRecord,
    target: &Target,
    label: &str,
    rule: Rule,
    inc_reset: bool,
) -> Vec<String> {
    let paths = record.worker.resolve(&target.host);
    let verbose = if rule == Rule::Monthly { "off" } else { "on" };

    let mut argv = vec![format!("{}/{}", paths.script_dir, AGENT_BINARY)];
    if !paths.lib_path.is_empty() {
        argv.push("--lib-path".to_string());
        argv.push(paths.lib_path.clone());
    }
    argv.extend([
        "--user".to_string(),
        record.manager.user.clone(),
        "--host".to_string(),
        record.manager.host.clone(),
        "--device".to_string(),
        record.storage.remote_device.clone(),
        "--label".to_string(),
        label.to_string(),
        "--list-file-dir".to_string(),
        record.storage.list_file_dir.clone(),
        "--filesys".to_string(),
        target.path.clone(),
        "--current-rule".to_string(),
        rule.as_str().to_string(),
        "--buffer".to_string(),
        record.storage.buffer.clone(),
        "--inc-reset".to_string(),
        if inc_reset { "yes" } else { "no" }.to_string(),
        "--verbose".to_string(),
        verbose.to_string(),
    ]);
    argv
}

/// Commands that prepare the on-client incremental state files before the
/// archiver streams.
///
/// - `monthly` starts a fresh base: every tier's state file for this
///   target is removed and an empty `-monthly` file is seeded.
/// - `weekly` with a reset re-seeds the whole chain below it: the
///   `-weekly` file and its `-monthly` reference base are removed and the
///   base is seeded empty.
/// - `daily` with a reset purges the `-daily` and `-weekly` files and
///   seeds a fresh `-weekly` reference.
/// - `daily`/`weekly` without a reset leave the files alone; the archiver
///   appends to its own file as it streams.
pub fn state_file_commands(
    record: &ArchiveRecord,
    target: &Target,
    rule: Rule,
    inc_reset: bool,
) -> Vec<Vec<String>> {
    let file = |r: Rule| {
        format!(
            "{}/{}",
            record.storage.list_file_dir,
            state_file_name(record.name(), &target.host, &target.path, r)
        )
    };

    match rule {
        Rule::Monthly => vec![
            vec![
                "rm".into(),
                "-f".into(),
                file(Rule::Monthly),
                file(Rule::Weekly),
                file(Rule::Daily),
            ],
            vec!["touch".into(), file(Rule::Monthly)],
        ],
        Rule::Weekly if inc_reset => vec![
            vec![
                "rm".into(),
                "-f".into(),
                file(Rule::Weekly),
                file(Rule::Monthly),
            ],
            vec!["touch".into(), file(Rule::Monthly)],
        ],
        Rule::Daily if inc_reset => vec![
            vec![
                "rm".into(),
                "-f".into(),
                file(Rule::Daily),
                file(Rule::Weekly),
            ],
            vec!["touch".into(), file(Rule::Weekly)],
        ],
        _ => Vec::new(),
    }
}
