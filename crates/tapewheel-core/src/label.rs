//! Label and file-name synthesis.
//!
//! A label is the header string embedded in an archive identifying its
//! source and tier: `"<archive>::<host>:<path>-<rule>-<MM.DD.YYYY>"`. The
//! same stem (label minus the date) drives the file name the receiver
//! synthesises for directory destinations, and a separate slug scheme names
//! the on-client incremental state files.

use chrono::{NaiveDate, Weekday};

use crate::rule::Rule;

/// Labels longer than this fall back to the last path segment.
pub const DEFAULT_MAX_LABEL_LEN: usize = 80;

/// Build the archive header label for one target.
///
/// If the full form exceeds `max_len`, the path is replaced by its final
/// segment so the label stays readable in catalogues.
pub fn build_label(
    archive: &str,
    host: &str,
    path: &str,
    rule: Rule,
    date: NaiveDate,
    max_len: usize,
) -> String {
    let stamp = date.format("%m.%d.%Y");
    let full = format!("{archive}::{host}:{path}-{rule}-{stamp}");
    if full.len() <= max_len {
        return full;
    }
    let short = last_segment(path);
    format!("{archive}::{host}:{short}-{rule}-{stamp}")
}

/// The label without its trailing date segment. This is the stem the
/// receiver sanitises into a destination file name.
pub fn label_stem(archive: &str, host: &str, path: &str, rule: Rule) -> String {
    format!("{archive}::{host}:{path}-{rule}")
}

/// Sanitise a label stem for use as a file name: `:` becomes `_`,
/// `/` becomes `.`.
pub fn sanitize_for_file(stem: &str) -> String {
    stem.chars()
        .map(|c| match c {
            ':' => '_',
            '/' => '.',
            other => other,
        })
        .collect()
}

/// File name the receiver synthesises when the destination is a directory
/// rather than a block device.
pub fn synthesized_file_name(stem: &str, weekday: Weekday) -> String {
    format!("{}.{}.tgz", sanitize_for_file(stem), weekday)
}

/// Slug used inside on-client incremental state file names: `/` becomes `:`.
pub fn path_slug(path: &str) -> String {
    path.replace('/', ":")
}

/// Name of the on-client incremental state file for one
/// `(archive, host, path, rule)` combination.
pub fn state_file_name(archive: &str, host: &str, path: &str, rule: Rule) -> String {
    format!("{archive}::{host}:{}-{rule}", path_slug(path))
}

fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(path)
}
