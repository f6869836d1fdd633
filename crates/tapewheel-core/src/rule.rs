//! Backup rules and the calendar predicates that drive them.
//!
//! The three incremental tiers chain together: `monthly` is a fresh full
//! base, `weekly` is a listed-incremental referenced to the monthly state
//! file, `daily` is referenced to the weekly one. `none` means the archive
//! is idle that day.

use std::cmp::Ordering;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Backup tier executed on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rule {
    Monthly,
    Weekly,
    Daily,
    #[default]
    None,
}

impl Rule {
    /// Document string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Weekly => "weekly",
            Self::Daily => "daily",
            Self::None => "none",
        }
    }

    /// Parse from a document string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "monthly" => Some(Self::Monthly),
            "weekly" => Some(Self::Weekly),
            "daily" => Some(Self::Daily),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    /// Dispatch ordering for a run: archives resolving to a cheaper rule run
    /// first, so operator-attention tape work (monthly) finishes the run.
    pub fn run_priority(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Daily => 1,
            Self::Weekly => 2,
            Self::Monthly => 3,
        }
    }

    /// Whether this rule streams anything at all.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl PartialOrd for Rule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rule {
    fn cmp(&self, other: &Self) -> Ordering {
        self.run_priority().cmp(&other.run_priority())
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Rule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid rule: {}", s))
    }
}

/// Weekday-to-rule mapping of one archive.
///
/// Field names match the document schema (`Mon`..`Sun`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(rename = "Mon", default)]
    pub mon: Rule,
    #[serde(rename = "Tue", default)]
    pub tue: Rule,
    #[serde(rename = "Wed", default)]
    pub wed: Rule,
    #[serde(rename = "Thu", default)]
    pub thu: Rule,
    #[serde(rename = "Fri", default)]
    pub fri: Rule,
    #[serde(rename = "Sat", default)]
    pub sat: Rule,
    #[serde(rename = "Sun", default)]
    pub sun: Rule,
}

impl Schedule {
    /// Rule configured for the given weekday.
    pub fn rule_for(&self, day: Weekday) -> Rule {
        match day {
            Weekday::Mon => self.mon,
            Weekday::Tue => self.tue,
            Weekday::Wed => self.wed,
            Weekday::Thu => self.thu,
            Weekday::Fri => self.fri,
            Weekday::Sat => self.sat,
            Weekday::Sun => self.sun,
        }
    }

    /// Iterate over all seven entries in `Mon..Sun` order.
    pub fn iter(&self) -> impl Iterator<Item = (Weekday, Rule)> + '_ {
        [
            (Weekday::Mon, self.mon),
            (Weekday::Tue, self.tue),
            (Weekday::Wed, self.wed),
            (Weekday::Thu, self.thu),
            (Weekday::Fri, self.fri),
            (Weekday::Sat, self.sat),
            (Weekday::Sun, self.sun),
        ]
        .into_iter()
    }

    /// True if any weekday is scheduled as a monthly run.
    pub fn has_monthly(&self) -> bool {
        self.iter().any(|(_, r)| r == Rule::Monthly)
    }
}

/// Resolve the rule to execute today: an operator override wins over the
/// schedule entry.
pub fn resolve_rule(schedule: &Schedule, day: Weekday, force: Option<Rule>) -> Rule {
    force.unwrap_or_else(|| schedule.rule_for(day))
}

/// Monthly runs are only allowed in the first week of a calendar month.
pub fn can_do_monthly(day_of_month: u32) -> bool {
    (1..=7).contains(&day_of_month)
}

/// Whether an archive without a monthly tier needs a fresh incremental base.
///
/// True iff the schedule contains no monthly rule and either no archive has
/// ever completed, or the last one completed in a different calendar month
/// (year included, so a record untouched for exactly twelve months still
/// resets).
pub fn incremental_reset(
    schedule: &Schedule,
    archive_date: Option<&DateTime<Utc>>,
    today: NaiveDate,
) -> bool {
    if schedule.has_monthly() {
        return false;
    }
    match archive_date {
        None => true,
        Some(last) => {
            let last = last.date_naive();
            last.month() != today.month() || last.year() != today.year()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn daily_only() -> Schedule {
        Schedule {
            mon: Rule::Daily,
            tue: Rule::Daily,
            wed: Rule::Daily,
            thu: Rule::Daily,
            fri: Rule::Daily,
            sat: Rule::Weekly,
            sun: Rule::None,
        }
    }

    #[test]
    fn test_rule_parse() {
        assert_eq!(Rule::parse("monthly"), Some(Rule::Monthly));
        assert_eq!(Rule::parse("WEEKLY"), Some(Rule::Weekly));
        assert_eq!(Rule::parse("daily"), Some(Rule::Daily));
        assert_eq!(Rule::parse("none"), Some(Rule::None));
        assert_eq!(Rule::parse("hourly"), None);
    }

    #[test]
    fn test_run_priority_ordering() {
        assert!(Rule::None < Rule::Daily);
        assert!(Rule::Daily < Rule::Weekly);
        assert!(Rule::Weekly < Rule::Monthly);
    }

    #[test]
    fn test_resolve_rule_force_wins() {
        let schedule = daily_only();
        assert_eq!(resolve_rule(&schedule, Weekday::Sun, None), Rule::None);
        assert_eq!(
            resolve_rule(&schedule, Weekday::Sun, Some(Rule::Monthly)),
            Rule::Monthly
        );
        assert_eq!(resolve_rule(&schedule, Weekday::Sat, None), Rule::Weekly);
    }

    #[test]
    fn test_can_do_monthly_first_week_only() {
        for day in 1..=7 {
            assert!(can_do_monthly(day), "day {} should allow monthly", day);
        }
        for day in [8, 14, 28, 31] {
            assert!(!can_do_monthly(day), "day {} should refuse monthly", day);
        }
    }

    #[test]
    fn test_incremental_reset_requires_no_monthly() {
        let mut schedule = daily_only();
        schedule.sun = Rule::Monthly;
        let today = NaiveDate::from_ymd_opt(2025, 8, 2).unwrap();
        assert!(!incremental_reset(&schedule, None, today));
    }

    #[test]
    fn test_incremental_reset_on_month_change() {
        let schedule = daily_only();
        let today = NaiveDate::from_ymd_opt(2025, 8, 2).unwrap();

        // Never archived: reset.
        assert!(incremental_reset(&schedule, None, today));

        // Archived in July, run in August: reset.
        let july = Utc.with_ymd_and_hms(2025, 7, 28, 3, 0, 0).unwrap();
        assert!(incremental_reset(&schedule, Some(&july), today));

        // Archived earlier the same month: no reset.
        let august = Utc.with_ymd_and_hms(2025, 8, 1, 3, 0, 0).unwrap();
        assert!(!incremental_reset(&schedule, Some(&august), today));
    }

    #[test]
    fn test_incremental_reset_year_boundary() {
        let schedule = daily_only();
        let today = NaiveDate::from_ymd_opt(2026, 8, 2).unwrap();
        let last_year = Utc.with_ymd_and_hms(2025, 8, 2, 3, 0, 0).unwrap();
        assert!(incremental_reset(&schedule, Some(&last_year), today));
    }

    #[test]
    fn test_schedule_serde_keys() {
        let yaml = "Mon: daily\nTue: daily\nWed: daily\nThu: daily\nFri: daily\nSat: weekly\nSun: monthly\n";
        let schedule: Schedule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(schedule.rule_for(Weekday::Sun), Rule::Monthly);
        assert!(schedule.has_monthly());
    }
}
