//! The run context threaded through the scheduler, executor and notifier.
//!
//! Everything an execution step needs to know about "today" and the
//! operator's overrides lives here, so nothing reaches for process-wide
//! state.

use std::path::PathBuf;

use chrono::{Datelike, Local, NaiveDate, Weekday};
use tapewheel_core::Rule;

use crate::cli::Args;

/// Immutable per-run parameters.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config_dir: PathBuf,
    /// Calendar date of the run.
    pub today: NaiveDate,
    /// Day-of-week used for rule resolution; `--day` overrides the real one.
    pub weekday: Weekday,
    /// `--rule` override applied to every archive.
    pub forced_rule: Option<Rule>,
    /// `--archive` filter.
    pub archive_filter: Option<String>,
    pub color: bool,
}

impl RunContext {
    /// Build a context from parsed CLI arguments and the local clock.
    pub fn from_args(args: &Args, color: bool) -> Self {
        let today = Local::now().date_naive();
        Self {
            config_dir: args.config_dir.clone(),
            weekday: args.day.unwrap_or_else(|| today.weekday()),
            today,
            forced_rule: args.rule.map(Into::into),
            archive_filter: args.archive.clone(),
            color,
        }
    }

    pub fn day_of_month(&self) -> u32 {
        self.today.day()
    }

    /// Tomorrow's date and weekday, for the notifier's preview email.
    pub fn tomorrow(&self) -> (NaiveDate, Weekday) {
        let date = self.today.succ_opt().unwrap_or(self.today);
        (date, self.weekday.succ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(today: NaiveDate, weekday: Weekday) -> RunContext {
        RunContext {
            config_dir: PathBuf::from("/etc/tapewheel"),
            today,
            weekday,
            forced_rule: None,
            archive_filter: None,
            color: false,
        }
    }

    #[test]
    fn test_tomorrow_advances_both_parts() {
        let ctx = context(
            NaiveDate::from_ymd_opt(2025, 9, 14).unwrap(),
            Weekday::Sun,
        );
        let (date, weekday) = ctx.tomorrow();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 9, 15).unwrap());
        assert_eq!(weekday, Weekday::Mon);
    }

    #[test]
    fn test_day_of_month() {
        let ctx = context(NaiveDate::from_ymd_opt(2025, 9, 3).unwrap(), Weekday::Wed);
        assert_eq!(ctx.day_of_month(), 3);
    }
}
