//! Command-line surface of the manager.

use std::path::PathBuf;

use chrono::Weekday;
use clap::{Parser, ValueEnum};
use tapewheel_core::Rule;

/// Decide what to back up today, stream it from the clients, rotate the
/// destination sets and write the updated state back.
#[derive(Parser, Debug)]
#[command(name = "tapewheel", version, about)]
pub struct Args {
    /// Directory holding the per-archive configuration documents.
    #[arg(long, value_name = "DIR")]
    pub config_dir: PathBuf,

    /// Only run the archive with this name.
    #[arg(long, value_name = "NAME")]
    pub archive: Option<String>,

    /// Force this rule for every archive instead of today's schedule entry.
    #[arg(long, value_enum, value_name = "RULE")]
    pub rule: Option<RuleArg>,

    /// Pretend today is this weekday (Mon..Sun).
    #[arg(long, value_name = "DAY", value_parser = parse_day)]
    pub day: Option<Weekday>,

    /// Disable ANSI colors regardless of TERM.
    #[arg(long)]
    pub no_color: bool,

    /// Print usage and exit.
    #[arg(long, hide = true)]
    pub usage: bool,

    /// Verbose (debug-level) logging.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,
}

/// clap-facing mirror of [`Rule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RuleArg {
    Monthly,
    Weekly,
    Daily,
    None,
}

impl From<RuleArg> for Rule {
    fn from(arg: RuleArg) -> Self {
        match arg {
            RuleArg::Monthly => Rule::Monthly,
            RuleArg::Weekly => Rule::Weekly,
            RuleArg::Daily => Rule::Daily,
            RuleArg::None => Rule::None,
        }
    }
}

fn parse_day(s: &str) -> Result<Weekday, String> {
    match s.to_lowercase().as_str() {
        "mon" => Ok(Weekday::Mon),
        "tue" => Ok(Weekday::Tue),
        "wed" => Ok(Weekday::Wed),
        "thu" => Ok(Weekday::Thu),
        "fri" => Ok(Weekday::Fri),
        "sat" => Ok(Weekday::Sat),
        "sun" => Ok(Weekday::Sun),
        other => Err(format!("invalid day '{}', expected Mon..Sun", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let args = Args::try_parse_from(["tapewheel", "--config-dir", "/etc/tapewheel"]).unwrap();
        assert_eq!(args.config_dir, PathBuf::from("/etc/tapewheel"));
        assert!(args.archive.is_none());
        assert!(args.rule.is_none());
    }

    #[test]
    fn test_parse_overrides() {
        let args = Args::try_parse_from([
            "tapewheel",
            "--config-dir",
            "/etc/tapewheel",
            "--archive",
            "prod",
            "--rule",
            "monthly",
            "--day",
            "Sun",
            "--no-color",
        ])
        .unwrap();
        assert_eq!(args.archive.as_deref(), Some("prod"));
        assert_eq!(Rule::from(args.rule.unwrap()), Rule::Monthly);
        assert_eq!(args.day, Some(Weekday::Sun));
        assert!(args.no_color);
    }

    #[test]
    fn test_config_dir_is_required() {
        assert!(Args::try_parse_from(["tapewheel"]).is_err());
    }

    #[test]
    fn test_bad_day_rejected() {
        assert!(
            Args::try_parse_from(["tapewheel", "--config-dir", "/x", "--day", "Someday"]).is_err()
        );
    }
}
