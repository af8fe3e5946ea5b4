//! Command-line interface definition.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone};
use clap::{Parser, Subcommand};

/// chronofy - query calendars and events from the Cronofy API
#[derive(Debug, Parser)]
#[command(name = "chronofy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "CHRONOFY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Access token (overrides `token` in config.toml)
    #[arg(long, env = "CHRONOFY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Print raw JSON responses
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Returns the output format based on CLI flags.
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human readable lines.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List calendars
    Calendars,

    /// Show one calendar
    Calendar {
        /// Calendar ID
        id: String,
    },

    /// List events (defaults to today)
    Events {
        /// Start of the range (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = parse_datetime)]
        from: Option<DateTime<FixedOffset>>,

        /// End of the range (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = parse_datetime)]
        to: Option<DateTime<FixedOffset>>,

        /// IANA timezone sent as `tzid` (defaults to the local zone)
        #[arg(long)]
        tz: Option<String>,

        /// Print every event instead of only the first
        #[arg(long, short)]
        all: bool,
    },

    /// Exchange the client credentials for a new access token
    Authorize,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration with secrets redacted
    Dump,

    /// Validate configuration and resolve secret references
    Validate,

    /// Show configuration file path
    Path,
}

/// Parses an RFC 3339 timestamp, or a date taken as local midnight.
pub fn parse_datetime(value: &str) -> Result<DateTime<FixedOffset>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt);
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("expected RFC 3339 or YYYY-MM-DD, got `{}`", value))?;
    date.and_hms_opt(0, 0, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| format!("midnight does not exist locally on {}", date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_events_flags() {
        let cli = Cli::try_parse_from([
            "chronofy",
            "--token",
            "abc",
            "--json",
            "events",
            "--from",
            "2024-01-01T09:00:00+01:00",
            "--tz",
            "Europe/Paris",
        ])
        .unwrap();

        assert_eq!(cli.token.as_deref(), Some("abc"));
        assert_eq!(cli.output_format(), OutputFormat::Json);
        match cli.command {
            Command::Events { from, to, tz, all } => {
                assert_eq!(from.unwrap().to_rfc3339(), "2024-01-01T09:00:00+01:00");
                assert!(to.is_none());
                assert_eq!(tz.as_deref(), Some("Europe/Paris"));
                assert!(!all);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn calendar_requires_id() {
        assert!(Cli::try_parse_from(["chronofy", "calendar"]).is_err());
        let cli = Cli::try_parse_from(["chronofy", "calendar", "cal_1"]).unwrap();
        assert!(matches!(cli.command, Command::Calendar { ref id } if id == "cal_1"));
    }

    #[test]
    fn parse_datetime_accepts_dates() {
        let dt = parse_datetime("2024-03-05").unwrap();
        assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn parse_datetime_rejects_garbage() {
        let err = parse_datetime("next tuesday").unwrap_err();
        assert!(err.contains("next tuesday"));
    }
}
