//! Read-only importer for the legacy line-oriented document format.
//!
//! Legacy documents carry one `dotted.key>value` pair per line:
//!
//! ```text
//! meta.name>prod
//! targets.partitions>h1:/etc,h2:/var/lib
//! storage.dailySets>3
//! state.currentSet.daily>1
//! ```
//!
//! Lines are folded into a nested mapping and decoded through the same
//! serde model as the canonical YAML, so both formats agree on every field
//! by construction. Writing this format back is not supported.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::archive::ArchiveRecord;
use crate::error::{Error, Result};

/// Load an archive record from a legacy `.object` document.
pub fn load_legacy(path: &Path) -> Result<ArchiveRecord> {
    let text = std::fs::read_to_string(path)?;
    parse_legacy(&text).map_err(|reason| Error::invalid_document(path, reason))
}

fn parse_legacy(text: &str) -> std::result::Result<ArchiveRecord, String> {
    let mut root = Mapping::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line
            .split_once('>')
            .ok_or_else(|| format!("line {}: missing '>' separator", lineno + 1))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("line {}: empty key", lineno + 1));
        }
        insert_dotted(&mut root, key, scalar(value.trim()));
    }

    serde_yaml::from_value(Value::Mapping(root)).map_err(|e| e.to_string())
}

/// Insert `value` at a dotted key path, creating intermediate mappings.
/// A later line for the same path wins, matching last-write semantics of
/// the legacy tooling.
fn insert_dotted(root: &mut Mapping, dotted: &str, value: Value) {
    let mut segments = dotted.split('.').peekable();
    let mut node = root;

    while let Some(segment) = segments.next() {
        let key = Value::String(segment.to_string());
        if segments.peek().is_none() {
            node.insert(key, value);
            return;
        }
        let entry = node
            .entry(key)
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if !entry.is_mapping() {
            *entry = Value::Mapping(Mapping::new());
        }
        node = entry.as_mapping_mut().unwrap();
    }
}

/// Type a raw scalar the way a YAML parser would, so counters and ports
/// come out as numbers while names stay strings.
fn scalar(raw: &str) -> Value {
    serde_yaml::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;
    use tempfile::TempDir;

    const SAMPLE_OBJECT: &str = "\
# legacy wizard output
meta.name>prod
meta.description>production hosts
manager.managerHost>vault.example.com
manager.managerUser>backup
manager.managerPort>22
targets.partitions>h1:/etc,h2:/var/lib
worker.default.scriptDir>/opt/tapewheel/bin
worker.default.libPath>/opt/tapewheel/lib
schedule.Mon>daily
schedule.Tue>daily
schedule.Wed>daily
schedule.Thu>daily
schedule.Fri>daily
schedule.Sat>weekly
schedule.Sun>monthly
storage.logDir>/var/log/tapewheel
storage.remoteDevice>/dev/nst0
storage.listFileDir>/var/lib/tapewheel
storage.dailySets>3
storage.weeklySets>2
storage.monthlySets>2
notifications.adminUser>operator@example.com
state.currentRule>daily
state.status>ok
state.currentSet.daily>1
";

    #[test]
    fn test_load_legacy_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prod.object");
        std::fs::write(&path, SAMPLE_OBJECT).unwrap();

        let record = load_legacy(&path).unwrap();
        assert_eq!(record.name(), "prod");
        assert_eq!(record.targets.len(), 2);
        assert_eq!(record.manager.port, 22);
        assert_eq!(record.storage.daily_sets, 3);
        assert_eq!(record.state.current_rule, Rule::Daily);
        assert_eq!(record.state.current_set.daily, Some(1));
        record.validate().unwrap();
    }

    #[test]
    fn test_last_line_wins() {
        let doc = format!("{SAMPLE_OBJECT}storage.dailySets>5\n");
        let record = parse_legacy(&doc).unwrap();
        assert_eq!(record.storage.daily_sets, 5);
    }

    #[test]
    fn test_missing_separator_is_an_error() {
        let err = parse_legacy("meta.name prod").unwrap_err();
        assert!(err.contains("line 1"));
    }

    #[test]
    fn test_values_may_contain_separator_free_paths() {
        let doc = SAMPLE_OBJECT.replace(
            "storage.remoteDevice>/dev/nst0",
            "storage.remoteDevice>/backup/vol",
        );
        let record = parse_legacy(&doc).unwrap();
        assert_eq!(record.storage.remote_device, "/backup/vol");
    }
}
