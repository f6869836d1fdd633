//! The archive record: one managed backup configuration plus its state.
//!
//! Field and key names follow the persistence document schema; the record
//! itself is a plain typed struct tree so every consumer works with real
//! fields instead of dotted key paths.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rotation::SetCounters;
use crate::rule::{self, Rule, Schedule};
use crate::status::ArchiveStatus;

/// Identity block of an archive document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveMeta {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// The receiving side for streamed archives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerEndpoint {
    #[serde(rename = "managerHost")]
    pub host: String,
    #[serde(rename = "managerUser")]
    pub user: String,
    #[serde(rename = "managerPort", default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    22
}

/// One `host:path` pair ("partition") within an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub host: String,
    pub path: String,
}

impl Target {
    /// Parse a `host:/path` element of the partitions string.
    pub fn parse(s: &str) -> Result<Self> {
        let (host, path) = s
            .split_once(':')
            .ok_or_else(|| Error::validation(format!("partition '{}' is not host:path", s)))?;
        if host.is_empty() || !path.starts_with('/') {
            return Err(Error::validation(format!(
                "partition '{}' needs a host and an absolute path",
                s
            )));
        }
        Ok(Self {
            host: host.to_string(),
            path: path.to_string(),
        })
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.path)
    }
}

/// Ordered target list, persisted as the comma-joined `partitions` string.
/// Order is preserved and defines execution order within an archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TargetsDoc", into = "TargetsDoc")]
pub struct Targets(pub Vec<Target>);

#[derive(Serialize, Deserialize)]
struct TargetsDoc {
    partitions: String,
}

impl TryFrom<TargetsDoc> for Targets {
    type Error = Error;

    fn try_from(doc: TargetsDoc) -> Result<Self> {
        doc.partitions
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Target::parse)
            .collect::<Result<Vec<_>>>()
            .map(Targets)
    }
}

impl From<Targets> for TargetsDoc {
    fn from(targets: Targets) -> Self {
        let partitions = targets
            .0
            .iter()
            .map(Target::to_string)
            .collect::<Vec<_>>()
            .join(",");
        Self { partitions }
    }
}

impl std::ops::Deref for Targets {
    type Target = Vec<Target>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Where the on-client worker lives on one host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPaths {
    #[serde(rename = "scriptDir")]
    pub script_dir: String,
    #[serde(rename = "libPath", default)]
    pub lib_path: String,
}

/// Worker path resolution: a `default` entry plus optional per-host
/// overrides keyed by host name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub default: WorkerPaths,
    #[serde(flatten)]
    pub overrides: BTreeMap<String, WorkerPaths>,
}

impl WorkerConfig {
    /// Override-then-fallback: the per-host entry wins when present.
    pub fn resolve(&self, host: &str) -> &WorkerPaths {
        self.overrides.get(host).unwrap_or(&self.default)
    }
}

/// Destination and log locations plus the per-rule set pool sizes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(rename = "logDir")]
    pub log_dir: String,
    #[serde(rename = "remoteDevice")]
    pub remote_device: String,
    #[serde(rename = "listFileDir")]
    pub list_file_dir: String,
    #[serde(rename = "dailySets", default)]
    pub daily_sets: u32,
    #[serde(rename = "weeklySets", default)]
    pub weekly_sets: u32,
    #[serde(rename = "monthlySets", default)]
    pub monthly_sets: u32,
    /// Receiver-side reader command; `cat` unless operators configure
    /// something else.
    #[serde(default = "default_buffer", skip_serializing_if = "is_default_buffer")]
    pub buffer: String,
}

fn default_buffer() -> String {
    "cat".to_string()
}

fn is_default_buffer(s: &str) -> bool {
    s == "cat"
}

impl StorageConfig {
    /// Size of the destination-set pool for a rule.
    pub fn total_sets(&self, rule: Rule) -> u32 {
        match rule {
            Rule::Monthly => self.monthly_sets,
            Rule::Weekly => self.weekly_sets,
            Rule::Daily => self.daily_sets,
            Rule::None => 0,
        }
    }
}

/// Notification hook commands and the operator address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationHooks {
    #[serde(rename = "adminUser", default)]
    pub admin_user: String,
    #[serde(rename = "notifyTape", default)]
    pub notify_tape: String,
    #[serde(rename = "notifyTar", default)]
    pub notify_tar: String,
    #[serde(rename = "notifyError", default)]
    pub notify_error: String,
}

/// Mutable per-archive state, committed only when a run succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveState {
    #[serde(rename = "currentRule", default)]
    pub current_rule: Rule,
    #[serde(
        rename = "archiveDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub archive_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: ArchiveStatus,
    /// Last worker command dispatched, kept for diagnostics.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
    #[serde(rename = "currentSet", default)]
    pub current_set: SetCounters,
}

/// One archive's full configuration and state, as loaded from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub meta: ArchiveMeta,
    pub manager: ManagerEndpoint,
    pub targets: Targets,
    pub worker: WorkerConfig,
    pub schedule: Schedule,
    pub storage: StorageConfig,
    #[serde(default)]
    pub notifications: NotificationHooks,
    #[serde(default)]
    pub state: ArchiveState,
}

impl ArchiveRecord {
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Today's rule: the operator override wins over the schedule entry.
    pub fn resolved_rule(&self, day: Weekday, force: Option<Rule>) -> Rule {
        rule::resolve_rule(&self.schedule, day, force)
    }

    /// Whether this run needs a fresh incremental base (see
    /// [`rule::incremental_reset`]).
    pub fn incremental_reset(&self, today: NaiveDate) -> bool {
        rule::incremental_reset(&self.schedule, self.state.archive_date.as_ref(), today)
    }

    pub fn total_sets(&self, rule: Rule) -> u32 {
        self.storage.total_sets(rule)
    }

    /// Structural checks beyond what deserialization enforces.
    pub fn validate(&self) -> Result<()> {
        if self.meta.name.is_empty() {
            return Err(Error::validation("archive name is empty"));
        }
        if !self
            .meta
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(Error::validation(format!(
                "archive name '{}' is not filesystem-safe",
                self.meta.name
            )));
        }
        if self.targets.is_empty() {
            return Err(Error::validation(format!(
                "archive '{}' has no targets",
                self.meta.name
            )));
        }
        if self.schedule.has_monthly() && self.storage.monthly_sets == 0 {
            return Err(Error::validation(format!(
                "archive '{}' schedules monthly runs but has no monthly sets",
                self.meta.name
            )));
        }
        for rule in [Rule::Monthly, Rule::Weekly, Rule::Daily] {
            let total = self.total_sets(rule);
            if let Some(current) = self.state.current_set.get(rule)
                && total > 0
                && current >= total
            {
                return Err(Error::validation(format!(
                    "archive '{}': {} set counter {} out of range (pool size {})",
                    self.meta.name, rule, current, total
                )));
            }
        }
        Ok(())
    }
}
