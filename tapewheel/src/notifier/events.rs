//! Operator-visible notification events.
//!
//! Everything the notifier says — hook log lines, the standardized error
//! block, the tomorrow-preview email — is derived from one of these
//! events, so wording lives in a single place.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use tapewheel_core::Rule;

/// Program name used in subjects and the error block.
pub const SELF_NAME: &str = "tapewheel";

/// One operator-visible event in an archive run.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    /// An archive is about to start streaming.
    RunStarting { archive: String },
    /// One target begins streaming.
    TargetStarting { archive: String, target: String },
    /// A target or the whole archive failed.
    ArchiveError {
        archive: String,
        context: String,
        detail: String,
        at: DateTime<Utc>,
    },
    /// Preview of tomorrow's expected rule and volume.
    TomorrowPreview {
        archive: String,
        rule: Rule,
        set_index: u32,
        date: NaiveDate,
        weekday: Weekday,
        reset: bool,
    },
}

impl NotificationEvent {
    /// Short subject line for mail and log headers.
    pub fn subject(&self) -> String {
        match self {
            Self::RunStarting { archive } => {
                format!("[{}] {}: run starting", SELF_NAME, archive)
            }
            Self::TargetStarting { archive, target } => {
                format!("[{}] {}: archiving {}", SELF_NAME, archive, target)
            }
            Self::ArchiveError { archive, .. } => {
                format!("[{}] {}: archive failed", SELF_NAME, archive)
            }
            Self::TomorrowPreview {
                archive,
                rule,
                set_index,
                ..
            } => format!(
                "[{}] {}: {} set {} tomorrow",
                SELF_NAME, archive, rule, set_index
            ),
        }
    }

    /// Full message body.
    ///
    /// For errors this is the standardized block operators grep for:
    /// program name, context, detail and timestamp on fixed lines.
    pub fn body(&self) -> String {
        match self {
            Self::RunStarting { archive } => {
                format!("Archive {} is about to stream.", archive)
            }
            Self::TargetStarting { archive, target } => {
                format!("Archive {} is streaming {}.", archive, target)
            }
            Self::ArchiveError {
                archive,
                context,
                detail,
                at,
            } => format!(
                "{} ERROR\nwhile {}, archive {} failed\nspecific: {}\nat {}",
                SELF_NAME,
                context,
                archive,
                detail,
                at.to_rfc3339(),
            ),
            Self::TomorrowPreview {
                archive,
                rule,
                set_index,
                date,
                weekday,
                reset,
            } => {
                let mut body = format!(
                    "Archive {} expects a {} run on {} ({}).\nVolume: {} set {}.\n",
                    archive,
                    rule,
                    date.format("%m.%d.%Y"),
                    weekday,
                    rule,
                    set_index,
                );
                if *reset {
                    body.push_str("The incremental chain restarts with a fresh base.\n");
                }
                body
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_error_body_is_the_standard_block() {
        let event = NotificationEvent::ArchiveError {
            archive: "prod".into(),
            context: "archiving h1:/etc".into(),
            detail: "worker exited Some(2)".into(),
            at: Utc.with_ymd_and_hms(2025, 9, 14, 4, 30, 0).unwrap(),
        };
        let lines: Vec<_> = event.body().lines().map(str::to_string).collect();
        assert_eq!(lines[0], "tapewheel ERROR");
        assert_eq!(lines[1], "while archiving h1:/etc, archive prod failed");
        assert_eq!(lines[2], "specific: worker exited Some(2)");
        assert!(lines[3].starts_with("at 2025-09-14"));
    }

    #[test]
    fn test_tomorrow_preview_mentions_reset() {
        let event = NotificationEvent::TomorrowPreview {
            archive: "flat".into(),
            rule: Rule::Daily,
            set_index: 2,
            date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            weekday: Weekday::Fri,
            reset: true,
        };
        assert!(event.subject().contains("daily set 2"));
        let body = event.body();
        assert!(body.contains("08.01.2025"));
        assert!(body.contains("fresh base"));

        let quiet = NotificationEvent::TomorrowPreview {
            archive: "flat".into(),
            rule: Rule::Daily,
            set_index: 2,
            date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            weekday: Weekday::Fri,
            reset: false,
        };
        assert!(!quiet.body().contains("fresh base"));
    }
}
